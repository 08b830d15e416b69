use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde_json::json;

/// Application-level errors
///
/// Absence of data (empty window, saturated partner, partner without
/// conceptual groups) is never an error; those states travel as
/// `ReportStatus` values inside successful responses.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Data source error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown partner for the selected window: {0}")]
    UnknownPartner(String),

    #[error("CSV export error: {0}")]
    Export(#[from] csv::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for failures of the underlying data source, as opposed to
    /// request validation problems.
    pub fn is_data_source_failure(&self) -> bool {
        matches!(self, AppError::Database(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidRange { .. } | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::UnknownPartner(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Export(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
