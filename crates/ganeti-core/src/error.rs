//! Error types for Ganeti RAPI operations.
//!
//! Every non-success HTTP response is classified here, in [`Error::from_status`], into one
//! variant of a closed error enum. Call sites never re-derive the status-to-kind mapping.

use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Details of a failed RAPI request.
///
/// Carried by every HTTP-derived [`Error`] variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFailure {
    /// Human-readable message extracted from the response body
    pub message: String,
    /// HTTP status code of the response
    pub status_code: u16,
    /// URL of the failed request
    pub url: String,
}

impl ApiFailure {
    /// Create a new failure record.
    #[must_use]
    pub fn new(message: impl Into<String>, status_code: u16, url: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code,
            url: url.into(),
        }
    }
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Main error type for Ganeti RAPI operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The request was rejected as invalid (400)
    #[error("Bad request: {0}")]
    BadRequest(ApiFailure),

    /// Authentication failed (401)
    #[error("Authentication failed: {0}")]
    Authentication(ApiFailure),

    /// The authenticated user may not perform the operation (403)
    #[error("Authorization failed: {0}")]
    Authorization(ApiFailure),

    /// The requested resource does not exist (404)
    #[error("Resource not found: {0}")]
    ResourceNotFound(ApiFailure),

    /// The server failed to handle the request (500-599)
    #[error("Server error: {0}")]
    Server(ApiFailure),

    /// Any other non-success status
    #[error("Unexpected error: {0}")]
    Unexpected(ApiFailure),

    /// A job did not reach a finalized state before the deadline
    #[error("Job {job_id} timed out after {secs} seconds", secs = .timeout.as_secs_f64())]
    Timeout {
        /// Identifier of the job being waited on
        job_id: u64,
        /// Deadline that was exceeded
        timeout: Duration,
    },

    /// The RAPI endpoint could not be reached
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// HTTP transport failure without a response
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// A response body could not be decoded
    #[error("Failed to parse RAPI response: {0}")]
    ParseError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid endpoint or URL
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Invalid UUID format
    #[error("Invalid UUID: {0}")]
    InvalidUuid(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Specialized result type for Ganeti RAPI operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build the typed error for a non-success response.
    ///
    /// 400, 401, 403 and 404 map to their dedicated variants, 500 through 599 to
    /// [`Error::Server`], anything else to [`Error::Unexpected`].
    #[must_use]
    pub fn from_status(status_code: u16, message: impl Into<String>, url: impl Into<String>) -> Self {
        let failure = ApiFailure::new(message, status_code, url);
        match status_code {
            400 => Self::BadRequest(failure),
            401 => Self::Authentication(failure),
            403 => Self::Authorization(failure),
            404 => Self::ResourceNotFound(failure),
            500..=599 => Self::Server(failure),
            _ => Self::Unexpected(failure),
        }
    }

    /// Build the typed error from a raw response body.
    ///
    /// See [`error_message`] for how the message is extracted.
    #[must_use]
    pub fn from_response(status_code: u16, body: &str, url: impl Into<String>) -> Self {
        Self::from_status(status_code, error_message(status_code, body), url)
    }

    /// Returns the request failure details for HTTP-derived errors.
    #[must_use]
    pub const fn api_failure(&self) -> Option<&ApiFailure> {
        match self {
            Self::BadRequest(failure)
            | Self::Authentication(failure)
            | Self::Authorization(failure)
            | Self::ResourceNotFound(failure)
            | Self::Server(failure)
            | Self::Unexpected(failure) => Some(failure),
            _ => None,
        }
    }

    /// Returns the HTTP status code for HTTP-derived errors.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        self.api_failure().map(|failure| failure.status_code)
    }

    /// Returns the request URL for HTTP-derived errors.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.api_failure().map(|failure| failure.url.as_str())
    }

    /// Returns the server-provided message for HTTP-derived errors.
    ///
    /// The message never carries the variant prefix, so for [`Error::Unexpected`] it lacks
    /// the `Unexpected error: ` text that `Display` adds.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.api_failure().map(|failure| failure.message.as_str())
    }

    /// Returns true if this is a poller timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns the error code for this error type.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Authentication(_) => "AUTHENTICATION",
            Self::Authorization(_) => "AUTHORIZATION",
            Self::ResourceNotFound(_) => "RESOURCE_NOT_FOUND",
            Self::Server(_) => "SERVER_ERROR",
            Self::Unexpected(_) => "UNEXPECTED",
            Self::Timeout { .. } => "TIMEOUT",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::HttpError(_) => "HTTP_ERROR",
            Self::ParseError(_) => "PARSE_ERROR",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            Self::InvalidUuid(_) => "INVALID_UUID",
            Self::ValidationError(_) => "VALIDATION_ERROR",
        }
    }

    /// Returns true if this error should be logged as a serious error.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(
            self,
            Self::Server(_) | Self::Unexpected(_) | Self::ConfigError(_) | Self::ParseError(_)
        )
    }
}

/// Extract a human-readable message from an error response body.
///
/// A JSON object body yields its `message` field (or the raw text when absent), suffixed with
/// `": {explain}"` when a non-empty `explain` field is present. Any other body yields the raw
/// text, or `"HTTP {status} Error"` when empty.
#[must_use]
pub fn error_message(status_code: u16, body: &str) -> String {
    let fallback = || {
        if body.is_empty() {
            format!("HTTP {status_code} Error")
        } else {
            body.to_string()
        }
    };

    let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) else {
        return fallback();
    };

    let message = fields
        .get("message")
        .map_or_else(|| body.to_string(), value_text);

    match fields.get("explain").map(value_text) {
        Some(explain) if !explain.is_empty() => format!("{message}: {explain}"),
        _ => message,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            Self::ServiceUnavailable(err.to_string())
        } else if err.is_decode() {
            Self::ParseError(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<uuid::Error> for Error {
    fn from(err: uuid::Error) -> Self {
        Self::InvalidUuid(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://localhost/2/dummy";

    #[test]
    fn test_mapped_statuses() {
        let err = Error::from_status(400, "bad", URL);
        assert!(matches!(err, Error::BadRequest(_)));
        assert_eq!(err.status_code(), Some(400));

        let err = Error::from_status(401, "auth", URL);
        assert!(matches!(err, Error::Authentication(_)));
        assert_eq!(err.status_code(), Some(401));

        let err = Error::from_status(403, "denied", URL);
        assert!(matches!(err, Error::Authorization(_)));
        assert_eq!(err.status_code(), Some(403));

        let err = Error::from_status(404, "missing", URL);
        assert!(matches!(err, Error::ResourceNotFound(_)));
        assert_eq!(err.status_code(), Some(404));
    }

    #[test]
    fn test_server_range_boundaries() {
        for status in [500, 502, 503, 599] {
            let err = Error::from_status(status, "boom", URL);
            assert!(matches!(err, Error::Server(_)), "status {status}");
            assert_eq!(err.status_code(), Some(status));
        }
    }

    #[test]
    fn test_unmapped_statuses_are_unexpected() {
        for status in [100, 402, 405, 409, 418, 499, 600, 999] {
            let err = Error::from_status(status, "odd", URL);
            assert!(matches!(err, Error::Unexpected(_)), "status {status}");
            assert_eq!(err.status_code(), Some(status));
        }
    }

    #[test]
    fn test_unexpected_message_has_no_prefix() {
        let err = Error::from_status(418, "I'm a teapot", URL);
        assert_eq!(err.message(), Some("I'm a teapot"));
        assert_eq!(err.to_string(), "Unexpected error: I'm a teapot");
    }

    #[test]
    fn test_failure_carries_url_and_message() {
        let err = Error::from_status(404, "Not Found", URL);
        assert_eq!(err.url(), Some(URL));
        assert_eq!(err.message(), Some("Not Found"));
        assert_eq!(err.to_string(), "Resource not found: Not Found");
    }

    #[test]
    fn test_message_with_explain() {
        let body = r#"{"message":"Bad request","explain":"Invalid body contents"}"#;
        assert_eq!(error_message(400, body), "Bad request: Invalid body contents");
    }

    #[test]
    fn test_message_without_explain() {
        let body = r#"{"message":"Authentication required"}"#;
        assert_eq!(error_message(401, body), "Authentication required");
    }

    #[test]
    fn test_message_with_empty_explain() {
        let body = r#"{"code": 403, "message":"Permission denied","explain":""}"#;
        assert_eq!(error_message(403, body), "Permission denied");
    }

    #[test]
    fn test_message_missing_falls_back_to_body() {
        let body = r#"{"code": 500}"#;
        assert_eq!(error_message(500, body), body);
    }

    #[test]
    fn test_message_non_json_body() {
        assert_eq!(error_message(502, "upstream gone"), "upstream gone");
    }

    #[test]
    fn test_message_json_array_body() {
        assert_eq!(error_message(500, "[1, 2]"), "[1, 2]");
    }

    #[test]
    fn test_message_empty_body() {
        assert_eq!(error_message(503, ""), "HTTP 503 Error");
    }

    #[test]
    fn test_from_response() {
        let body = r#"{"message":"Not Found","explain":"Nothing matches the given URI"}"#;
        let err = Error::from_response(404, body, URL);
        assert!(matches!(err, Error::ResourceNotFound(_)));
        assert_eq!(err.message(), Some("Not Found: Nothing matches the given URI"));
    }

    #[test]
    fn test_timeout_display() {
        let err = Error::Timeout {
            job_id: 2,
            timeout: Duration::from_secs(300),
        };
        assert_eq!(err.to_string(), "Job 2 timed out after 300 seconds");
        assert!(err.is_timeout());
        assert!(err.status_code().is_none());
        assert_eq!(err.error_code(), "TIMEOUT");
    }

    #[test]
    fn test_http_errors_are_not_timeouts() {
        for status in [400, 401, 403, 404, 500, 418] {
            assert!(!Error::from_status(status, "x", URL).is_timeout());
        }
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::from_status(400, "x", URL).error_code(), "BAD_REQUEST");
        assert_eq!(Error::from_status(401, "x", URL).error_code(), "AUTHENTICATION");
        assert_eq!(Error::from_status(403, "x", URL).error_code(), "AUTHORIZATION");
        assert_eq!(
            Error::from_status(404, "x", URL).error_code(),
            "RESOURCE_NOT_FOUND"
        );
        assert_eq!(Error::from_status(500, "x", URL).error_code(), "SERVER_ERROR");
        assert_eq!(Error::from_status(418, "x", URL).error_code(), "UNEXPECTED");
        assert_eq!(
            Error::ServiceUnavailable("x".to_string()).error_code(),
            "SERVICE_UNAVAILABLE"
        );
        assert_eq!(Error::ParseError("x".to_string()).error_code(), "PARSE_ERROR");
        assert_eq!(Error::ConfigError("x".to_string()).error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_should_log() {
        assert!(Error::from_status(500, "x", URL).should_log());
        assert!(Error::from_status(418, "x", URL).should_log());
        assert!(Error::ConfigError("test".to_string()).should_log());

        assert!(!Error::from_status(404, "x", URL).should_log());
        assert!(!Error::from_status(400, "x", URL).should_log());
    }

    #[test]
    fn test_from_url_parse_error() {
        let err = url::Url::parse("not a url").unwrap_err();
        let rapi_err: Error = err.into();
        assert!(matches!(rapi_err, Error::InvalidEndpoint(_)));
    }

    #[test]
    fn test_from_serde_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let rapi_err: Error = err.into();
        assert!(matches!(rapi_err, Error::ParseError(_)));
    }

    #[test]
    fn test_from_uuid_error() {
        let err = uuid::Uuid::parse_str("not-a-uuid").unwrap_err();
        let rapi_err: Error = err.into();
        assert_eq!(rapi_err.error_code(), "INVALID_UUID");
    }
}
