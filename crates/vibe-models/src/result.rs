use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Status-tagged outcome of every tool operation.
///
/// Serializes flat, with the payload's fields next to the tag:
///
/// ```json
/// {"status": "success", "symbol": "AAPL", "price": 200.5, "timestamp": "2025-06-30T14:00:00Z"}
/// {"status": "error", "message": "Invalid order side. Use 'buy' or 'sell'."}
/// ```
///
/// Payloads must therefore serialize as JSON objects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ToolResult<T> {
    Success(T),
    Error { message: String },
}

impl<T> ToolResult<T> {
    pub fn error(message: impl Display) -> Self {
        ToolResult::Error {
            message: message.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolResult::Success(_))
    }

    pub fn is_error(&self) -> bool {
        !self.is_success()
    }

    /// The payload, if this is a success.
    pub fn success(self) -> Option<T> {
        match self {
            ToolResult::Success(value) => Some(value),
            ToolResult::Error { .. } => None,
        }
    }

    /// The message, if this is an error.
    pub fn message(&self) -> Option<&str> {
        match self {
            ToolResult::Success(_) => None,
            ToolResult::Error { message } => Some(message),
        }
    }
}

impl<T, E: Display> From<Result<T, E>> for ToolResult<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => ToolResult::Success(value),
            Err(e) => ToolResult::error(e),
        }
    }
}
