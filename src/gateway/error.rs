use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::service::SubmissionError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    InternalError(String),
}

impl From<SubmissionError> for GatewayError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::InvalidInput { .. } => Self::InvalidRequest(err.to_string()),
            SubmissionError::DocumentNotFound { .. } | SubmissionError::JobNotFound { .. } => {
                Self::NotFound(err.to_string())
            }
            SubmissionError::QueueFull { .. } | SubmissionError::ShuttingDown { .. } => {
                Self::Unavailable(err.to_string())
            }
            SubmissionError::Queue(_) | SubmissionError::Store(_) | SubmissionError::Io { .. } => {
                Self::InternalError(err.to_string())
            }
        }
    }
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::InternalError(_) => {
                error!(error = %self, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}
