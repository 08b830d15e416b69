use axum::{
    extract::{Query, State},
    response::Response,
    Extension, Json,
};
use chrono::Utc;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::{CategoryOverview, WindowParams},
    routes::{csv_download, AppState},
    services::{export, report},
};

async fn load(state: &AppState, window: &WindowParams) -> AppResult<CategoryOverview> {
    report::category_overview(
        state.source.as_ref(),
        window,
        &state.settings,
        Utc::now().date_naive(),
    )
    .await
}

/// Handler for category-level performance
pub async fn get_overview(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(window): Query<WindowParams>,
) -> AppResult<Json<CategoryOverview>> {
    tracing::info!(request_id = %request_id, "Processing category overview request");

    let overview = load(&state, &window).await?;

    tracing::info!(
        request_id = %request_id,
        categories = overview.categories.len(),
        status = ?overview.status,
        "Category overview completed"
    );

    Ok(Json(overview))
}

/// Handler for the category performance CSV download
pub async fn export_categories(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(window): Query<WindowParams>,
) -> AppResult<Response> {
    tracing::info!(request_id = %request_id, "Exporting category performance");

    let overview = load(&state, &window).await?;
    let body = export::categories_csv(&overview.categories)?;

    Ok(csv_download("category_performance.csv", body))
}
