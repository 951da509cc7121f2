//! # fedgate-error
//!
//! Unified error types for the Fedgate federation gateway.
//!
//! All errors carry:
//! - Numeric error codes (FEDGATE-XXXX)
//! - Structured JSON context
//! - An optional user-actionable hint

mod code;
mod context;
mod convert;

pub use code::{ErrorCategory, ErrorCode};
pub use context::ErrorContext;
pub use convert::closest_match;

use serde::{Deserialize, Serialize};
use std::fmt;

/// The unified error type for all Fedgate operations.
///
/// A segment whose request failed sees exactly one of these, with the
/// connector or configuration failure preserved in `message` and an
/// optional `hint` telling the user what to fix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FedgateError {
    /// Numeric error code (e.g., "FEDGATE-3003")
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Structured context for programmatic handling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,

    /// User-actionable suggestion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl FedgateError {
    /// Create a new error with code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            hint: None,
        }
    }

    /// Add structured context
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Add a user-actionable hint
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Serialize to JSON for API responses
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::warn!("Failed to serialize FedgateError: {}", e);
            format!(
                r#"{{"code":"{}","message":"Serialization failed"}}"#,
                self.code
            )
        })
    }
}

impl fmt::Display for FedgateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, " (Hint: {})", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for FedgateError {}

/// Result type alias for Fedgate operations
pub type Result<T> = std::result::Result<T, FedgateError>;
