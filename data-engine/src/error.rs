//! Engine adapter errors

use explorer_types::{ConfigError, ErrorCode, ErrorInfo};
use thiserror::Error;
use wasm_bindgen::JsValue;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised by the engine adapter, the cache and the OPFS store
#[derive(Error, Debug)]
pub enum EngineError {
    /// An operation needed a live session but there is none
    #[error("DB is not initialized")]
    NotInitialized,

    /// A JS call rejected or threw
    #[error("{context}: {message}")]
    Js {
        context: &'static str,
        message: String,
    },

    /// The engine returned a row we could not decode
    #[error("failed to decode row: {0}")]
    Decode(#[from] serde_json::Error),

    /// Non-success HTTP status
    #[error("fetch {url} failed with status {status}")]
    Network { url: String, status: u16 },

    #[error("storage error: {0}")]
    Storage(String),

    /// Host environment lacks a capability
    #[error("{0} is not supported in this environment")]
    Unsupported(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// Adapter for `map_err` on JS promise results
    pub fn js(context: &'static str) -> impl Fn(JsValue) -> EngineError {
        move |value| EngineError::Js {
            context,
            message: js_message(&value),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::NotInitialized => ErrorCode::NotInitialized,
            EngineError::Js { .. } => ErrorCode::InvalidQuery,
            EngineError::Decode(_) => ErrorCode::ParseError,
            EngineError::Network { .. } => ErrorCode::NetworkError,
            EngineError::Storage(_) => ErrorCode::StorageError,
            EngineError::Unsupported(_) => ErrorCode::Unsupported,
            EngineError::Config(_) => ErrorCode::ConfigError,
        }
    }

    /// True for programmer errors that must reach the caller
    pub fn is_precondition(&self) -> bool {
        matches!(self, EngineError::NotInitialized | EngineError::Config(_))
    }

    /// Descriptor for the UI; JS and HTTP failures carry the raw cause as details
    pub fn info(&self) -> ErrorInfo {
        match self {
            EngineError::Js { context, message } => {
                ErrorInfo::new(self.code(), format!("{context} failed")).with_details(message.clone())
            }
            EngineError::Network { url, status } => {
                ErrorInfo::new(self.code(), format!("fetch {url} failed")).with_details(format!("HTTP {status}"))
            }
            _ => ErrorInfo::new(self.code(), self.to_string()),
        }
    }
}

impl From<EngineError> for JsValue {
    fn from(err: EngineError) -> Self {
        js_sys::Error::new(&err.info().to_string()).into()
    }
}

/// Best-effort text of a thrown JS value
pub(crate) fn js_message(value: &JsValue) -> String {
    if let Some(s) = value.as_string() {
        return s;
    }
    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen::JsCast;
        if let Some(err) = value.dyn_ref::<js_sys::Error>() {
            return String::from(err.message());
        }
    }
    format!("{:?}", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use explorer_types::ConfigField;

    #[test]
    fn precondition_errors_are_flagged() {
        assert!(EngineError::NotInitialized.is_precondition());
        assert!(EngineError::from(ConfigError::MissingField(ConfigField::DbPath)).is_precondition());
        assert!(!EngineError::Storage("quota".into()).is_precondition());
        assert!(!EngineError::Network { url: "u".into(), status: 500 }.is_precondition());
    }

    #[test]
    fn codes_and_messages() {
        let err = EngineError::Network {
            url: "https://example.com/a.parquet".into(),
            status: 404,
        };
        assert_eq!(err.code(), ErrorCode::NetworkError);
        assert_eq!(err.to_string(), "fetch https://example.com/a.parquet failed with status 404");
        assert_eq!(EngineError::NotInitialized.info().message, "DB is not initialized");
    }

    #[test]
    fn info_separates_cause_from_message() {
        let err = EngineError::Js {
            context: "instantiate duckdb",
            message: "worker script not found".into(),
        };
        assert_eq!(
            err.info().to_string(),
            "InvalidQuery: instantiate duckdb failed (worker script not found)"
        );

        let info = EngineError::Network { url: "https://example.com/a".into(), status: 503 }.info();
        assert_eq!(info.message, "fetch https://example.com/a failed");
        assert_eq!(info.details.as_deref(), Some("HTTP 503"));
        assert_eq!(EngineError::Storage("quota".into()).info().details, None);
    }

    #[test]
    fn decode_errors_convert() {
        let err: EngineError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert_eq!(err.code(), ErrorCode::ParseError);
    }
}
