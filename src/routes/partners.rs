use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Utc;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::{PartnerList, WindowParams},
    routes::AppState,
    services::report,
};

/// Handler for the partner selection list
pub async fn list_partners(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(window): Query<WindowParams>,
) -> AppResult<Json<PartnerList>> {
    tracing::debug!(request_id = %request_id, "Listing partners");

    let partners = report::partner_list(
        state.source.as_ref(),
        &window,
        &state.settings,
        Utc::now().date_naive(),
    )
    .await?;

    Ok(Json(partners))
}
