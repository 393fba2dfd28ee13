//! Error types for Currencycloud operations.

use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Main error type for Currencycloud operations.
#[derive(Error, Debug)]
pub enum CurrencyCloudError {
    /// A required parameter was not supplied. Raised before any I/O.
    #[error("Missing required parameter `{parameter}` for {operation}")]
    MissingParameter {
        operation: &'static str,
        parameter: &'static str,
    },

    /// A parameter was supplied but is malformed. Raised before any I/O.
    #[error("Invalid parameter `{parameter}`: {message}")]
    InvalidParameter {
        parameter: &'static str,
        message: String,
    },

    /// No session token; `login()` has not been called or the session was closed.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The API answered with an error status.
    #[error(transparent)]
    Remote(#[from] RemoteFailure),

    /// The request never produced an HTTP response.
    #[error("Network error: {0}")]
    Network(String),

    /// The response body did not match the expected model.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl CurrencyCloudError {
    /// Errors raised synchronously while validating caller input.
    pub fn is_invalid_parameters(&self) -> bool {
        matches!(
            self,
            CurrencyCloudError::MissingParameter { .. } | CurrencyCloudError::InvalidParameter { .. }
        )
    }

    /// Errors delivered through a lookup's future rather than raised up front.
    ///
    /// Besides the transport and API failures this includes `NotAuthenticated`,
    /// which a lookup reports once it runs without an open session.
    pub fn is_remote_failure(&self) -> bool {
        matches!(
            self,
            CurrencyCloudError::Remote(_)
                | CurrencyCloudError::Network(_)
                | CurrencyCloudError::UnexpectedResponse(_)
                | CurrencyCloudError::NotAuthenticated
        )
    }

    /// Whether a caller could reasonably retry. The client itself never does.
    pub fn is_retryable(&self) -> bool {
        match self {
            CurrencyCloudError::Network(_) => true,
            CurrencyCloudError::Remote(failure) => matches!(
                failure.kind,
                RemoteFailureKind::TooManyRequests | RemoteFailureKind::InternalApplication
            ),
            _ => false,
        }
    }

    /// Stable error code, using the API's own code for remote failures.
    pub fn error_code(&self) -> &str {
        match self {
            CurrencyCloudError::MissingParameter { .. } => "missing_parameter",
            CurrencyCloudError::InvalidParameter { .. } => "invalid_parameter",
            CurrencyCloudError::NotAuthenticated => "not_authenticated",
            CurrencyCloudError::Remote(failure) => &failure.code,
            CurrencyCloudError::Network(_) => "network_error",
            CurrencyCloudError::UnexpectedResponse(_) => "unexpected_response",
            CurrencyCloudError::Configuration(_) => "configuration_error",
        }
    }
}

/// Result type alias for Currencycloud operations.
pub type Result<T> = std::result::Result<T, CurrencyCloudError>;

/// Classification of an API error response by HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteFailureKind {
    BadRequest,
    Authentication,
    Forbidden,
    NotFound,
    TooManyRequests,
    InternalApplication,
    Unexpected,
}

impl RemoteFailureKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => RemoteFailureKind::BadRequest,
            401 => RemoteFailureKind::Authentication,
            403 => RemoteFailureKind::Forbidden,
            404 => RemoteFailureKind::NotFound,
            429 => RemoteFailureKind::TooManyRequests,
            500..=599 => RemoteFailureKind::InternalApplication,
            _ => RemoteFailureKind::Unexpected,
        }
    }
}

impl fmt::Display for RemoteFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RemoteFailureKind::BadRequest => "bad request",
            RemoteFailureKind::Authentication => "authentication failed",
            RemoteFailureKind::Forbidden => "forbidden",
            RemoteFailureKind::NotFound => "not found",
            RemoteFailureKind::TooManyRequests => "too many requests",
            RemoteFailureKind::InternalApplication => "internal application error",
            RemoteFailureKind::Unexpected => "unexpected status",
        };
        f.write_str(name)
    }
}

/// One entry of the `error_messages` object in an API error body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMessage {
    /// Parameter the message refers to, or `base` for request-wide errors.
    pub field: String,
    pub code: String,
    pub message: String,
}

/// An error response from the Currencycloud API.
#[derive(Error, Debug, Clone)]
#[error("{request} failed: {kind} (HTTP {status}, {code})")]
pub struct RemoteFailure {
    pub kind: RemoteFailureKind,
    pub status: u16,
    /// The API's `error_code`, e.g. `rate_detailed_failed`.
    pub code: String,
    pub messages: Vec<FieldMessage>,
    /// Request line, e.g. `GET /v2/rates/detailed`.
    pub request: String,
}

impl RemoteFailure {
    /// Build from an HTTP status and the decoded error body.
    ///
    /// The body is expected to look like
    /// `{"error_code": "...", "error_messages": {"field": [{"code", "message"}]}}`;
    /// anything else still produces a failure with an `unknown_error` code.
    pub fn from_response(status: u16, request: impl Into<String>, body: &Value) -> Self {
        let code = body
            .get("error_code")
            .and_then(Value::as_str)
            .unwrap_or("unknown_error")
            .to_string();

        let mut messages = Vec::new();
        if let Some(fields) = body.get("error_messages").and_then(Value::as_object) {
            for (field, entries) in fields {
                let entries = match entries {
                    Value::Array(items) => items.iter().collect::<Vec<_>>(),
                    other => vec![other],
                };
                for entry in entries {
                    messages.push(FieldMessage {
                        field: field.clone(),
                        code: entry
                            .get("code")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        message: entry
                            .get("message")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                    });
                }
            }
        }

        Self {
            kind: RemoteFailureKind::from_status(status),
            status,
            code,
            messages,
            request: request.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_remote_failure_from_body() {
        let body = json!({
            "error_code": "rate_detailed_failed",
            "error_messages": {
                "buy_currency": [{
                    "code": "buy_currency_is_in_invalid_format",
                    "message": "buy_currency is not a valid ISO 4217 currency code",
                    "params": { "type": "currency" }
                }],
                "base": {
                    "code": "invalid_request",
                    "message": "Request could not be processed"
                }
            }
        });

        let failure = RemoteFailure::from_response(400, "GET /v2/rates/detailed", &body);
        assert_eq!(failure.kind, RemoteFailureKind::BadRequest);
        assert_eq!(failure.code, "rate_detailed_failed");
        assert_eq!(failure.messages.len(), 2);
        assert_eq!(failure.messages[0].field, "buy_currency");
        assert_eq!(failure.messages[1].code, "invalid_request");
    }

    #[test]
    fn test_remote_failure_without_body() {
        let failure = RemoteFailure::from_response(503, "GET /v2/rates/find", &Value::Null);
        assert_eq!(failure.kind, RemoteFailureKind::InternalApplication);
        assert_eq!(failure.code, "unknown_error");
        assert!(failure.messages.is_empty());
    }

    #[test]
    fn test_error_classification() {
        let missing = CurrencyCloudError::MissingParameter {
            operation: "rates.get",
            parameter: "amount",
        };
        assert!(missing.is_invalid_parameters());
        assert!(!missing.is_remote_failure());
        assert!(!missing.is_retryable());

        assert!(CurrencyCloudError::NotAuthenticated.is_remote_failure());
        assert!(!CurrencyCloudError::NotAuthenticated.is_invalid_parameters());

        let config = CurrencyCloudError::Configuration("no login id".to_string());
        assert!(!config.is_remote_failure());
        assert!(!config.is_invalid_parameters());

        let throttled: CurrencyCloudError =
            RemoteFailure::from_response(429, "GET /v2/rates/find", &Value::Null).into();
        assert!(throttled.is_remote_failure());
        assert!(throttled.is_retryable());

        let denied: CurrencyCloudError =
            RemoteFailure::from_response(401, "GET /v2/rates/find", &json!({"error_code": "auth_failed"}))
                .into();
        assert!(!denied.is_retryable());
        assert_eq!(denied.error_code(), "auth_failed");
    }
}
