use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric error codes following FEDGATE-XXXX format.
///
/// ## Code Ranges
/// - **1000-1999**: Source/connector errors
/// - **3000-3999**: Configuration errors
/// - **5000-5999**: Internal/System errors
///
/// Codes are stable across versions (semver contract).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
#[non_exhaustive]
pub enum ErrorCode {
    // === Source Errors (1000-1999) ===
    /// FEDGATE-1001: No connector registered under the requested profile
    ProfileNotFound = 1001,
    /// FEDGATE-1002: Connector fragment enumeration failed
    EnumerationFailed = 1002,

    // === Configuration Errors (3000-3999) ===
    /// FEDGATE-3001: Scan option has an invalid value
    InvalidScanOption = 3001,
    /// FEDGATE-3002: Required scan option is missing
    MissingScanOption = 3002,
    /// FEDGATE-3003: Distribution policy name not recognized
    UnknownDistributionPolicy = 3003,
    /// FEDGATE-3004: Request is malformed (e.g., zero segments)
    InvalidRequest = 3004,

    // === Internal Errors (5000-5999) ===
    /// FEDGATE-5001: Execution already registered under this identity
    AlreadyRegistered = 5001,
    /// FEDGATE-5002: Unexpected internal state
    Internal = 5002,
    /// FEDGATE-5003: Serialization/deserialization failed
    SerializationFailed = 5003,

    /// FEDGATE-9999: Unknown/unclassified error
    Unknown = 9999,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Get the formatted code string (e.g., "FEDGATE-3003")
    pub fn as_str(&self) -> String {
        format!("FEDGATE-{:04}", self.as_u16())
    }

    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self.as_u16() {
            1000..=1999 => ErrorCategory::Source,
            3000..=3999 => ErrorCategory::Config,
            5000..=5999 => ErrorCategory::Internal,
            _ => ErrorCategory::Internal,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> String {
        code.as_str()
    }
}

impl TryFrom<String> for ErrorCode {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        // Parse "FEDGATE-XXXX" format
        let num: u16 = s
            .strip_prefix("FEDGATE-")
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| "Invalid format".to_string())?;
        Self::try_from(num).map_err(|_| "Unknown code".to_string())
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = String;

    fn try_from(n: u16) -> std::result::Result<Self, Self::Error> {
        match n {
            1001 => Ok(Self::ProfileNotFound),
            1002 => Ok(Self::EnumerationFailed),
            3001 => Ok(Self::InvalidScanOption),
            3002 => Ok(Self::MissingScanOption),
            3003 => Ok(Self::UnknownDistributionPolicy),
            3004 => Ok(Self::InvalidRequest),
            5001 => Ok(Self::AlreadyRegistered),
            5002 => Ok(Self::Internal),
            5003 => Ok(Self::SerializationFailed),
            9999 => Ok(Self::Unknown),
            _ => Err(format!("Unknown error code: {}", n)),
        }
    }
}

/// High-level error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ErrorCategory {
    Source,
    Config,
    Internal,
}
