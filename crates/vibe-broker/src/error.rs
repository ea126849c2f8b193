use thiserror::Error;
use tracing::warn;
use vibe_models::ToolResult;

#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Vendor rejected the request. Displays the vendor's message verbatim.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Invalid response from broker: {0}")]
    Json(#[from] serde_json::Error),

    /// Local input validation failed; no vendor call was made.
    #[error("{0}")]
    InvalidInput(String),

    /// The vendor answered but returned nothing usable.
    #[error("{0}")]
    NoData(String),

    #[error("Artifact sink error: {0}")]
    Artifact(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BrokerError {
    /// Build an `Api` error from a non-success response body.
    ///
    /// The vendor's error body is `{"code": ..., "message": "..."}`; the message
    /// is surfaced as-is. Bodies without one fall back to the raw text, then to
    /// the status code.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .or_else(|| {
                let trimmed = body.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| format!("Broker returned HTTP {status}"));

        BrokerError::Api { status, message }
    }
}

/// Convert an adapter outcome into the tagged result handed to the agent,
/// logging failures.
pub(crate) fn conclude<T>(operation: &str, result: Result<T, BrokerError>) -> ToolResult<T> {
    if let Err(e) = &result {
        warn!(operation, error = %e, "Tool call failed");
    }
    result.into()
}
