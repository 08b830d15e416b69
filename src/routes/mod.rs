use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::{make_span_with_request_id, request_id_middleware},
    services::{EventSource, ReportSettings},
};

pub mod categories;
pub mod partners;
pub mod recommendations;

/// Shared, read-only state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn EventSource>,
    pub settings: ReportSettings,
}

impl AppState {
    pub fn new(source: Arc<dyn EventSource>, settings: ReportSettings) -> Self {
        Self { source, settings }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/partners", get(partners::list_partners))
        .route("/categories", get(categories::get_overview))
        .route("/categories/export", get(categories::export_categories))
        .route("/recommendations", get(recommendations::get_report))
        .route("/recommendations/export", get(recommendations::export_recommendations))
        .route("/usage/export", get(recommendations::export_usage))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Wraps a CSV document as a file download
fn csv_download(filename: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

/// Reduces a free-form name to characters safe inside a filename header
fn safe_filename_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
