//! # Error Contexts
//!
//! Structured metadata for errors to enable programmatic analysis.

use serde::{Deserialize, Serialize};

/// Structured context attached to a [`crate::FedgateError`].
///
/// Each variant provides the fields relevant to that error type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ErrorContext {
    /// Context for FEDGATE-1001 (ProfileNotFound)
    ProfileNotFound {
        profile: String,
        available_profiles: Vec<String>,
    },

    /// Context for FEDGATE-1002 (EnumerationFailed)
    Enumeration {
        profile: String,
        data_source: String,
    },

    /// Context for FEDGATE-3001/3002/3003 (scan option errors)
    ScanOption {
        option: String,
        value: Option<String>,
        allowed: Vec<String>,
    },

    /// Context for FEDGATE-5001 (AlreadyRegistered)
    Registration {
        transaction_id: String,
        segment_id: u32,
    },

    /// Generic key-value context for extensibility
    Generic {
        #[serde(flatten)]
        data: std::collections::HashMap<String, serde_json::Value>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_option_context_serde_roundtrip() {
        let ctx = ErrorContext::ScanOption {
            option: "ACTIVE_SEGMENT_COUNT".to_string(),
            value: Some("0".to_string()),
            allowed: vec!["1..=total_segments".to_string()],
        };

        let json = serde_json::to_string(&ctx).unwrap();
        let de: ErrorContext = serde_json::from_str(&json).unwrap();

        match de {
            ErrorContext::ScanOption { option, value, .. } => {
                assert_eq!(option, "ACTIVE_SEGMENT_COUNT");
                assert_eq!(value.as_deref(), Some("0"));
            }
            _ => panic!("Wrong variant"),
        }
    }
}
