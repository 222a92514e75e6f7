//! HTTP utilities for OCI REST API calls

use super::auth::RequestSigner;
use crate::error::InventoryError;
use anyhow::{Context, Result};
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;

/// Response header carrying the continuation token of a listing
pub const NEXT_PAGE_HEADER: &str = "opc-next-page";

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Truncate a response body and strip non-printable characters for logging
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = (0..=MAX_LOG_BODY_LENGTH)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Non-success HTTP response
#[derive(Debug, Error)]
#[error("API request failed: {status}")]
pub struct ApiError {
    pub status: StatusCode,
}

/// HTTP status of the first API failure in an error chain
pub fn api_status(error: &anyhow::Error) -> Option<StatusCode> {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<ApiError>())
        .map(|api| api.status)
}

/// A decoded JSON response plus its continuation token
#[derive(Debug, Clone)]
pub struct JsonPage {
    pub body: Value,
    pub next_page: Option<String>,
}

/// HTTP client wrapper for OCI API calls
#[derive(Clone)]
pub struct OciHttpClient {
    client: Client,
}

impl OciHttpClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("oci-inventory/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Make an authorized GET request
    pub async fn get(&self, url: &str, signer: &dyn RequestSigner) -> Result<JsonPage> {
        tracing::debug!("GET {}", url);

        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .build()
            .context("Failed to build request")?;
        signer
            .authorize(&mut request)
            .await
            .context("Failed to authorize request")?;

        let response = self
            .client
            .execute(request)
            .await
            .context("Failed to send request")?;

        let status = response.status();
        let next_page = response
            .headers()
            .get(NEXT_PAGE_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string());
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(ApiError { status }.into());
        }

        let body = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body).context("Failed to parse response JSON")?
        };

        Ok(JsonPage { body, next_page })
    }
}

/// Format an OCI API error for display
/// Security: Sanitizes error messages to avoid leaking sensitive API details
pub fn format_api_error(error: &anyhow::Error) -> String {
    let status = api_status(error).map(|s| s.as_u16()).or_else(|| {
        error
            .chain()
            .find_map(|cause| cause.downcast_ref::<InventoryError>())
            .and_then(InventoryError::status)
    });

    let known = match status {
        Some(401) => Some("Authentication failed. Refresh the session with 'oci session refresh'."),
        Some(403) => Some("Permission denied. Check the IAM policies granting inspect access."),
        Some(404) => Some("Resource not found or not authorized."),
        Some(429) => Some("Rate limit exceeded. Please try again later."),
        Some(500) | Some(503) => Some("OCI service temporarily unavailable. Please try again."),
        _ => None,
    };
    if let Some(message) = known {
        return message.to_string();
    }

    let error_str = format!("{:#}", error);
    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(160)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}
