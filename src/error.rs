use axum::{http::StatusCode, response::IntoResponse, Json};

use crate::services::form_controller::FormIssue;
use crate::services::generator_client::GeneratorError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("form session {0} not found")]
    FormNotFound(u64),

    #[error("row {0} not found")]
    RowNotFound(u64),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid page origin: {0}")]
    InvalidOrigin(String),

    #[error("{0}")]
    Incomplete(#[from] FormIssue),

    #[error("generator: {0}")]
    Generator(#[from] GeneratorError),

    #[error("too many open forms (limit {0})")]
    TooManyForms(usize),

    #[error("config: {0}")]
    Config(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::FormNotFound(_) | AppError::RowNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) | AppError::InvalidOrigin(_) => StatusCode::BAD_REQUEST,
            AppError::Incomplete(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Generator(_) => StatusCode::BAD_GATEWAY,
            AppError::TooManyForms(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("!!! 请求失败: {}", self);
        } else {
            tracing::warn!("--- 请求被拒绝: {}", self);
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
