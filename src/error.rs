use std::io;
use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub const NOT_FOUND_BODY: &str = "Not Found.";
pub const PROCESSING_ERROR_BODY: &str = "Error processing webhook.";
pub const NOT_EXECUTABLE_BODY: &str = "Internal Server Error: Action script not executable.";
pub const UNAUTHORIZED_BODY: &str = "Unauthorized.";

/// Custom error type for branch_hook operations
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("No route for this method and path")]
    RouteNotFound,

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Action script {0:?} is missing or not executable")]
    ActionNotExecutable(PathBuf),

    #[error("Action script exited with status {exit_code:?}")]
    ActionFailed { exit_code: Option<i32> },

    #[error("Action script failed to start: {0}")]
    ActionLaunchFailed(#[source] io::Error),

    #[error("Webhook signature rejected: {0}")]
    SignatureRejected(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl WebhookError {
    /// Status code reported to the webhook sender.
    ///
    /// Anything without a dedicated mapping falls back to 400, mirroring the
    /// catch-all around the whole payload handling path.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::RouteNotFound => StatusCode::NOT_FOUND,
            WebhookError::ActionNotExecutable(_) | WebhookError::ActionFailed { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            WebhookError::SignatureRejected(_) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Plaintext body for the response. Never carries diagnostic detail.
    pub fn response_body(&self) -> &'static str {
        match self {
            WebhookError::RouteNotFound => NOT_FOUND_BODY,
            WebhookError::ActionNotExecutable(_) => NOT_EXECUTABLE_BODY,
            WebhookError::SignatureRejected(_) => UNAUTHORIZED_BODY,
            _ => PROCESSING_ERROR_BODY,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        (self.status_code(), self.response_body()).into_response()
    }
}

/// Helper type for Results that use WebhookError
pub type Result<T> = std::result::Result<T, WebhookError>;
