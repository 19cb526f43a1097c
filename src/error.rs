use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::response;
use crate::notion::NotionError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    ValidationError(String),

    #[error("Unsupported content type: {0}")]
    UnsupportedMediaType(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Notion rejected the integration credentials: {0}")]
    UpstreamAuthError(String),

    #[error("Notion rejected the page: {0}")]
    UpstreamRejected(String),

    #[error("Notion is unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Notion did not respond in time")]
    UpstreamTimeout,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::UpstreamAuthError(_) | AppError::UpstreamRejected(_) => StatusCode::BAD_GATEWAY,
            AppError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Stable machine-readable kind, reported as `meta.error`.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) | AppError::UnsupportedMediaType(_) => "validation_error",
            AppError::ConfigError(_) => "configuration_error",
            AppError::UpstreamAuthError(_) => "upstream_auth_error",
            AppError::UpstreamRejected(_) => "upstream_rejected",
            AppError::UpstreamUnavailable(_) => "upstream_unavailable",
            AppError::UpstreamTimeout => "upstream_timeout",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, kind = self.kind(), "request failed");
        } else {
            tracing::warn!(error = %self, kind = self.kind(), "request rejected");
        }
        response::error::<()>(status, self.kind(), self.to_string()).into_response()
    }
}

impl From<NotionError> for AppError {
    fn from(err: NotionError) -> Self {
        match err {
            NotionError::Unauthorized(msg) => AppError::UpstreamAuthError(msg),
            NotionError::Rejected { status, code, message } if code.is_empty() => {
                AppError::UpstreamRejected(format!("{}: {}", status, message))
            }
            NotionError::Rejected { status, code, message } => {
                AppError::UpstreamRejected(format!("{} {}: {}", status, code, message))
            }
            NotionError::RateLimited(msg) => AppError::UpstreamUnavailable(format!("rate limited: {}", msg)),
            NotionError::ServerError { status, message } => {
                AppError::UpstreamUnavailable(format!("{}: {}", status, message))
            }
            NotionError::Timeout => AppError::UpstreamTimeout,
            NotionError::Transport(msg) => AppError::UpstreamUnavailable(msg),
            NotionError::InvalidResponse(msg) => {
                AppError::UpstreamUnavailable(format!("unexpected response from Notion: {}", msg))
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
