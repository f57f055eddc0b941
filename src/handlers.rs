use axum::{
    body::Bytes,
    extract::State as AxumState,
    extract::rejection::BytesRejection,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use tracing::{error, info, warn};

use crate::SharedState;
use crate::action::ActionOutcome;
use crate::error::{Result, WebhookError};
use crate::utils::{SIGNATURE_HEADER, verify_github_signature};
use crate::webhook::WebhookRequest;

pub const PROCESSED_BODY: &str = "Webhook processed successfully.";
pub const NO_ACTION_BODY: &str = "Webhook received, but no action taken.";

/// Successful answers to a webhook delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookReply {
    Processed,
    NoAction,
}

impl IntoResponse for WebhookReply {
    fn into_response(self) -> Response {
        let body = match self {
            WebhookReply::Processed => PROCESSED_BODY,
            WebhookReply::NoAction => NO_ACTION_BODY,
        };
        (StatusCode::OK, body).into_response()
    }
}

/// Fallback for every path and method other than `POST <webhook_path>`.
pub async fn not_found() -> WebhookError {
    WebhookError::RouteNotFound
}

/// Handles the push webhook POST request.
pub async fn handle_webhook(
    AxumState(state): AxumState<SharedState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Response {
    // The query string is part of the compared target
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    if method != Method::POST || target != state.config.webhook_path {
        return WebhookError::RouteNotFound.into_response();
    }

    match process_webhook(&state, method, target, &headers, body).await {
        Ok(reply) => reply.into_response(),
        Err(e) => {
            match &e {
                WebhookError::ActionNotExecutable(path) => error!(
                    "Error: {} is not executable. Please run 'chmod +x {}'.",
                    path.display(),
                    path.display()
                ),
                WebhookError::ActionFailed { exit_code } => {
                    error!("Action script exited with {:?}", exit_code)
                }
                WebhookError::SignatureRejected(reason) => {
                    warn!("Rejected webhook signature: {}", reason)
                }
                other => error!("Error processing webhook: {}", other),
            }
            e.into_response()
        }
    }
}

async fn process_webhook(
    state: &SharedState,
    method: Method,
    target: &str,
    headers: &HeaderMap,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<WebhookReply> {
    let body = body
        .map_err(|e| WebhookError::MalformedRequest(format!("failed to read body: {}", e)))?;
    let request = WebhookRequest::read(method, target.to_string(), headers, body)?;

    if let Some(secret) = state.config.webhook_secret.as_deref() {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                WebhookError::SignatureRejected(format!("no {} header supplied", SIGNATURE_HEADER))
            })?;
        if !verify_github_signature(secret, &request.body, signature) {
            return Err(WebhookError::SignatureRejected(
                "signature does not match payload".to_string(),
            ));
        }
    }

    let payload = request.payload()?;
    let Some(branch) = payload.branch() else {
        info!("Webhook received, but no branch ref found. Nothing to do.");
        return Ok(WebhookReply::NoAction);
    };
    info!("Webhook received for branch: {}", branch);

    let _guard = if state.config.serialize_actions {
        Some(state.action_lock.lock().await)
    } else {
        None
    };

    let outcome = state.dispatcher.dispatch(branch).await?;
    match &outcome {
        ActionOutcome::Success(invocation) => {
            info!("Action script stdout:\n{}", invocation.stdout);
            info!("Action script stderr:\n{}", invocation.stderr);
            info!(
                "Action for branch '{}' finished in {:?}",
                invocation.branch, invocation.duration
            );
        }
        ActionOutcome::ScriptFailed(invocation) => {
            error!("Error executing {}:", state.dispatcher.script_path().display());
            error!("{}", invocation.stdout);
            error!("{}", invocation.stderr);
        }
        ActionOutcome::NotExecutable => {}
    }

    outcome.into_result(state.dispatcher.script_path())?;
    Ok(WebhookReply::Processed)
}
