use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Failure axis of an [`ExchangeError`].
///
/// Callers branch on this to decide whether to retry (`Transport`), fix the
/// request (`Protocol`), handle a business condition (`Application`) or fix
/// the client setup (`Configuration`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Transport,
    Protocol,
    Application,
    Configuration,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Transport => "transport",
            Self::Protocol => "protocol",
            Self::Application => "application",
            Self::Configuration => "configuration",
        };
        f.write_str(name)
    }
}

/// Coarse grouping of exchange error codes, filled in by each venue's code table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    NoError,
    /// Bad JSON, missing headers, bad timestamp or signature
    MalformedInput,
    /// Key invalid, pending, blocked or lacking permission
    Authorization,
    /// Bad symbol, amount, rate, side, nonce or address
    Validation,
    /// Balance, pending withdrawal or order lookup conflicts
    ResourceState,
    /// Limits, cancel-only mode, suspensions, KYC
    Policy,
    Server,
    Unrecognized,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NoError => "no error",
            Self::MalformedInput => "malformed input",
            Self::Authorization => "authorization",
            Self::Validation => "validation",
            Self::ResourceState => "resource state",
            Self::Policy => "policy",
            Self::Server => "server",
            Self::Unrecognized => "unrecognized",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Connection timeout: {0}")]
    ConnectionTimeout(String),

    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Malformed response: {message}")]
    DeserializationError { message: String, body: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("API error {code} ({category}): {message}")]
    ApiError {
        code: i64,
        category: ErrorCategory,
        message: String,
    },

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error(transparent)]
    ConfigError(#[from] crate::core::config::ConfigError),
}

impl ExchangeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NetworkError(_) | Self::ConnectionTimeout(_) | Self::WebSocketError(_) => {
                ErrorKind::Transport
            }
            Self::HttpStatus { .. }
            | Self::DeserializationError { .. }
            | Self::SerializationError(_)
            | Self::InvalidParameters(_) => ErrorKind::Protocol,
            Self::ApiError { .. } => ErrorKind::Application,
            Self::AuthError(_) | Self::ConfigurationError(_) | Self::ConfigError(_) => {
                ErrorKind::Configuration
            }
        }
    }

    /// Only transport failures are worth retrying unchanged.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }

    /// Raw response body kept for diagnostics, if this error carries one.
    pub fn raw_body(&self) -> Option<&str> {
        match self {
            Self::HttpStatus { body, .. } | Self::DeserializationError { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Extract the exchange `error` code from an HTTP error body.
    ///
    /// Non-2xx replies frequently still carry an `{"error": n}` envelope with
    /// the real reason.
    pub fn envelope_error_code(&self) -> Option<i64> {
        let Self::HttpStatus { body, .. } = self else {
            return None;
        };
        serde_json::from_str::<Value>(body)
            .ok()?
            .get("error")?
            .as_i64()
    }

    pub(crate) fn malformed(message: impl Into<String>, body: &str) -> Self {
        Self::DeserializationError {
            message: message.into(),
            body: body.to_string(),
        }
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::ConnectionTimeout(format!("Request timed out: {}", e))
        } else {
            Self::NetworkError(format!("Request failed: {}", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ConfigError;

    #[test]
    fn api_error_names_code_and_category() {
        let err = ExchangeError::ApiError {
            code: 18,
            category: ErrorCategory::ResourceState,
            message: "Insufficient balance".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API error 18 (resource state): Insufficient balance"
        );
        assert_eq!(err.kind(), ErrorKind::Application);
        assert!(!err.is_retryable());
    }

    #[test]
    fn category_serializes_in_snake_case() {
        let json = serde_json::to_string(&ErrorCategory::MalformedInput).unwrap();
        assert_eq!(json, r#""malformed_input""#);
        let back: ErrorCategory = serde_json::from_str(r#""resource_state""#).unwrap();
        assert_eq!(back, ErrorCategory::ResourceState);
    }

    #[test]
    fn config_failures_render_differently() {
        let setup = ExchangeError::ConfigurationError("missing url".to_string());
        let invalid: ExchangeError =
            ConfigError::InvalidConfiguration("timeout must be positive".to_string()).into();

        assert_eq!(setup.to_string(), "Configuration error: missing url");
        assert_eq!(
            invalid.to_string(),
            "Invalid configuration: timeout must be positive"
        );
        assert_eq!(setup.kind(), ErrorKind::Configuration);
        assert_eq!(invalid.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn http_status_exposes_the_embedded_code() {
        let err = ExchangeError::HttpStatus {
            status: 400,
            body: r#"{"error":6}"#.to_string(),
        };
        assert_eq!(err.envelope_error_code(), Some(6));
        assert_eq!(err.raw_body(), Some(r#"{"error":6}"#));

        let html = ExchangeError::HttpStatus {
            status: 502,
            body: "<html/>".to_string(),
        };
        assert_eq!(html.envelope_error_code(), None);
    }
}
