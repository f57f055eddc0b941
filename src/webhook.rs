//! Webhook request reading and push payload parsing

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, header};
use serde::Deserialize;

use crate::error::{Result, WebhookError};

/// One incoming webhook request, alive only while it is being answered.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    pub method: Method,
    pub path: String,
    pub content_length: usize,
    pub body: Bytes,
}

impl WebhookRequest {
    /// Reads exactly `Content-Length` bytes out of the buffered body.
    pub fn read(method: Method, path: String, headers: &HeaderMap, body: Bytes) -> Result<Self> {
        let content_length = content_length(headers)?;
        if body.len() < content_length {
            return Err(WebhookError::MalformedRequest(format!(
                "body has {} bytes, Content-Length declared {}",
                body.len(),
                content_length
            )));
        }
        let body = body.slice(..content_length);

        Ok(Self {
            method,
            path,
            content_length,
            body,
        })
    }

    pub fn payload(&self) -> Result<PushPayload> {
        PushPayload::from_bytes(&self.body)
    }
}

/// Parses the `Content-Length` header as a non-negative integer.
pub fn content_length(headers: &HeaderMap) -> Result<usize> {
    let raw = headers
        .get(header::CONTENT_LENGTH)
        .ok_or_else(|| WebhookError::MalformedRequest("missing Content-Length".to_string()))?;
    let raw = raw
        .to_str()
        .map_err(|e| WebhookError::MalformedRequest(format!("unreadable Content-Length: {}", e)))?;
    raw.trim().parse::<usize>().map_err(|e| {
        WebhookError::MalformedRequest(format!("invalid Content-Length {:?}: {}", raw, e))
    })
}

/// The part of a push event we care about.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PushPayload {
    #[serde(rename = "ref", default)]
    pub git_ref: String,
}

impl PushPayload {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| WebhookError::MalformedRequest(format!("body is not UTF-8: {}", e)))?;
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| WebhookError::MalformedRequest(format!("body is not JSON: {}", e)))?;
        if !value.is_object() {
            return Err(WebhookError::MalformedRequest(
                "payload is not a JSON object".to_string(),
            ));
        }
        serde_json::from_value(value)
            .map_err(|e| WebhookError::MalformedRequest(format!("invalid ref field: {}", e)))
    }

    /// Branch named by `ref`, or `None` when nothing should run.
    pub fn branch(&self) -> Option<&str> {
        let branch = branch_from_ref(&self.git_ref);
        (!branch.is_empty()).then_some(branch)
    }
}

/// Last `/`-separated segment of a ref.
///
/// `refs/heads/feature/new-stuff` resolves to `new-stuff`; nested branch
/// names are not reconstructed.
pub fn branch_from_ref(git_ref: &str) -> &str {
    git_ref.rsplit('/').next().unwrap_or_default()
}
