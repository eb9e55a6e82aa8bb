//! Error descriptors shared between the engine adapter and the UI

use serde::{Deserialize, Serialize};
use tsify::Tsify;

/// Error information handed across the wasm boundary
#[derive(Tsify, Serialize, Deserialize, Clone, Debug)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct ErrorInfo {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Standard error codes
#[derive(Tsify, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum ErrorCode {
    /// Operation requires an open engine session
    NotInitialized,
    /// Invalid query syntax or engine-side failure
    InvalidQuery,
    /// Failed to decode engine output
    ParseError,
    /// Network request failed
    NetworkError,
    /// Local file storage operation failed
    StorageError,
    /// Host environment lacks a required capability
    Unsupported,
    /// Configuration record rejected
    ConfigError,
    /// Unknown error
    Unknown,
}

impl ErrorInfo {
    /// Create an error descriptor without details
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Attach details to the descriptor
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.details {
            Some(details) => write!(f, "{:?}: {} ({})", self.code, self.message, details),
            None => write!(f, "{:?}: {}", self.code, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_details_when_present() {
        let info = ErrorInfo::new(ErrorCode::NetworkError, "fetch failed").with_details("HTTP 404");
        assert_eq!(info.to_string(), "NetworkError: fetch failed (HTTP 404)");

        let bare = ErrorInfo::new(ErrorCode::NotInitialized, "DB is not initialized");
        assert_eq!(bare.to_string(), "NotInitialized: DB is not initialized");
    }

    #[test]
    fn serializes_without_empty_details() {
        let info = ErrorInfo::new(ErrorCode::InvalidQuery, "syntax error");
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["code"], "InvalidQuery");
        assert!(json.get("details").is_none());
    }
}
