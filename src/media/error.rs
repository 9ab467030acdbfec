use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Machine-readable failure code shared by analysis and download errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorCode {
    InvalidUrl,
    BackendUnreachable,
    Timeout,
    NetworkError,
    ApiError,
    /// The service answered with something that could not be decoded.
    Unexpected,
    /// Any other code supplied by the service, kept verbatim.
    Server(String),
}

impl ErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::InvalidUrl => "invalid_url",
            ErrorCode::BackendUnreachable => "backend_unreachable",
            ErrorCode::Timeout => "timeout",
            ErrorCode::NetworkError => "network_error",
            ErrorCode::ApiError => "api_error",
            ErrorCode::Unexpected => "unexpected",
            ErrorCode::Server(code) => code,
        }
    }

    /// Whether re-invoking the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::Timeout | ErrorCode::NetworkError | ErrorCode::ApiError
        )
    }
}

impl From<String> for ErrorCode {
    fn from(code: String) -> Self {
        match code.to_ascii_lowercase().as_str() {
            "invalid_url" => ErrorCode::InvalidUrl,
            "backend_unreachable" | "backend_not_connected" => ErrorCode::BackendUnreachable,
            "timeout" => ErrorCode::Timeout,
            "network_error" => ErrorCode::NetworkError,
            "api_error" => ErrorCode::ApiError,
            "unexpected" | "unexpected_error" => ErrorCode::Unexpected,
            _ => ErrorCode::Server(code),
        }
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> Self {
        code.as_str().to_string()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured failure returned by every client operation.
///
/// `AnalysisError` and `DownloadError` are the same shape; the aliases only
/// name which operation produced them.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct MediaError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

pub type AnalysisError = MediaError;
pub type DownloadError = MediaError;

impl MediaError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_parse_case_insensitively() {
        assert_eq!(ErrorCode::from("INVALID_URL".to_string()), ErrorCode::InvalidUrl);
        assert_eq!(
            ErrorCode::from("BACKEND_NOT_CONNECTED".to_string()),
            ErrorCode::BackendUnreachable
        );
        assert_eq!(ErrorCode::from("timeout".to_string()), ErrorCode::Timeout);
    }

    #[test]
    fn test_server_codes_are_kept_verbatim() {
        let code = ErrorCode::from("UNSUPPORTED_PLATFORM".to_string());
        assert_eq!(code, ErrorCode::Server("UNSUPPORTED_PLATFORM".to_string()));
        assert_eq!(code.as_str(), "UNSUPPORTED_PLATFORM");
        assert!(!code.is_retryable());
    }

    #[test]
    fn test_media_error_wire_shape() {
        let error: MediaError = serde_json::from_str(
            r#"{"code": "NETWORK_ERROR", "message": "offline", "details": "dns"}"#,
        )
        .unwrap();
        assert_eq!(error.code, ErrorCode::NetworkError);
        assert_eq!(error.to_string(), "offline");

        let value = serde_json::to_value(&error).unwrap();
        assert_eq!(value["code"], "network_error");
        assert_eq!(value["details"], "dns");
    }
}
