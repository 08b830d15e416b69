use axum::{
    extract::{Query, State},
    response::Response,
    Extension, Json,
};
use chrono::Utc;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::RecommendationReport,
    routes::{csv_download, safe_filename_stem, AppState},
    services::{export, report, ReportParams},
};

async fn load(state: &AppState, params: &ReportParams) -> AppResult<RecommendationReport> {
    report::recommendation_report(
        state.source.as_ref(),
        params,
        &state.settings,
        Utc::now().date_naive(),
    )
    .await
}

/// Handler for domain-aware partner recommendations
pub async fn get_report(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<ReportParams>,
) -> AppResult<Json<RecommendationReport>> {
    tracing::info!(
        request_id = %request_id,
        partner = ?params.partner,
        "Processing recommendation request"
    );

    let report = load(&state, &params).await?;

    tracing::info!(
        request_id = %request_id,
        status = ?report.status,
        recommendations = report.recommendations.len(),
        "Recommendation request completed"
    );

    Ok(Json(report))
}

/// Handler for the recommendations CSV download
pub async fn export_recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<ReportParams>,
) -> AppResult<Response> {
    tracing::info!(request_id = %request_id, "Exporting recommendations");

    let report = load(&state, &params).await?;
    let body = export::recommendations_csv(&report.recommendations)?;

    Ok(csv_download("recommendations.csv", body))
}

/// Handler for the partner usage CSV download
pub async fn export_usage(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<ReportParams>,
) -> AppResult<Response> {
    tracing::info!(request_id = %request_id, "Exporting partner usage");

    let report = load(&state, &params).await?;
    let body = export::usage_csv(&report.partner_usage)?;
    let stem = report
        .partner
        .as_deref()
        .map(safe_filename_stem)
        .unwrap_or_else(|| "partner".to_string());

    Ok(csv_download(&format!("{}_usage.csv", stem), body))
}
