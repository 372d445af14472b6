//! API error types.
//!
//! Errors are propagated verbatim from the resource service to the host. The
//! engines never interpret status codes; they only surface the failure. The
//! host's presentation layer turns an error into a toast via
//! [`ApiError::summary`].

use serde_json::Value;
use thiserror::Error;

/// Title used when nothing better can be extracted from an error.
pub const FALLBACK_ERROR_TITLE: &str = "An unexpected error occurred";

/// A failed resource-service call.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ApiError {
    /// The request never produced an HTTP response.
    #[error("Network error: {message}")]
    Network {
        /// Transport-level description.
        message: String,
    },

    /// The server answered with a non-success status.
    #[error("Request failed with status {status}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Parsed response body, if any.
        body: Option<Value>,
    },

    /// The response body could not be decoded.
    #[error("Invalid response: {message}")]
    Decode {
        /// Decoder message.
        message: String,
    },

    /// A plain message error raised by a service implementation.
    #[error("{message}")]
    Message {
        /// The message, possibly in `"title: detail"` form.
        message: String,
    },
}

/// Broad class of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Transport failure.
    Network,
    /// 401/403, handled above the engines by logging out or redirecting.
    Auth,
    /// 404.
    NotFound,
    /// Other 4xx.
    Client,
    /// 5xx.
    Server,
    /// Undecodable response.
    Decode,
    /// Anything else.
    Other,
}

/// Title/detail pair extracted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSummary {
    pub title: String,
    pub detail: Option<String>,
}

impl ErrorSummary {
    /// Split a message on its first `:` into title and detail.
    ///
    /// `"Validation failed: name: too short"` yields title
    /// `"Validation failed"` and detail `"name: too short"`. A blank detail
    /// (`"Conflict:"`) is treated as absent.
    pub fn from_message(message: &str) -> Self {
        match message.split_once(':') {
            Some((title, detail)) => Self {
                title: title.trim().to_string(),
                detail: Some(detail.trim())
                    .filter(|detail| !detail.is_empty())
                    .map(str::to_string),
            },
            None => Self {
                title: message.to_string(),
                detail: None,
            },
        }
    }

    fn fallback() -> Self {
        Self {
            title: FALLBACK_ERROR_TITLE.to_string(),
            detail: None,
        }
    }
}

impl ApiError {
    // =========================================================================
    // FACTORY METHODS
    // =========================================================================

    /// Create a network error from any error source.
    pub fn network(err: impl std::fmt::Display) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }

    /// Create an HTTP status error.
    pub fn http(status: u16, body: Option<Value>) -> Self {
        Self::Http { status, body }
    }

    /// Create a decode error.
    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode {
            message: err.to_string(),
        }
    }

    /// Create a plain message error.
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    // =========================================================================
    // CLASSIFICATION
    // =========================================================================

    /// HTTP status, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classify the error.
    pub fn kind(&self) -> ApiErrorKind {
        match self {
            Self::Network { .. } => ApiErrorKind::Network,
            Self::Decode { .. } => ApiErrorKind::Decode,
            Self::Message { .. } => ApiErrorKind::Other,
            Self::Http { status, .. } => match status {
                401 | 403 => ApiErrorKind::Auth,
                404 => ApiErrorKind::NotFound,
                400..=499 => ApiErrorKind::Client,
                500..=599 => ApiErrorKind::Server,
                _ => ApiErrorKind::Other,
            },
        }
    }

    /// Whether this is an authentication/authorisation failure.
    pub fn is_auth(&self) -> bool {
        self.kind() == ApiErrorKind::Auth
    }

    // =========================================================================
    // PRESENTATION
    // =========================================================================

    /// Extract a title/detail pair for display.
    ///
    /// Lookup order for HTTP errors: `body.error` (string), `body.message`
    /// (string), then the body itself when it is a string. Message-bearing
    /// variants use their message. Anything else falls back to
    /// [`FALLBACK_ERROR_TITLE`].
    pub fn summary(&self) -> ErrorSummary {
        let message = match self {
            Self::Http { body, .. } => body.as_ref().and_then(body_message),
            Self::Network { message } | Self::Decode { message } | Self::Message { message } => {
                Some(message.as_str())
            }
        };

        match message {
            Some(message) if !message.is_empty() => ErrorSummary::from_message(message),
            _ => ErrorSummary::fallback(),
        }
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self.kind() {
            ApiErrorKind::Network => Some("Check your connection and try again."),
            ApiErrorKind::Auth => Some("Sign in again or ask an administrator for access."),
            ApiErrorKind::NotFound => Some("The record may have been deleted. Refresh the list."),
            ApiErrorKind::Server => Some("The server had a problem. Try again in a moment."),
            ApiErrorKind::Client | ApiErrorKind::Decode | ApiErrorKind::Other => None,
        }
    }
}

fn body_message(body: &Value) -> Option<&str> {
    match body {
        Value::Object(map) => map
            .get("error")
            .and_then(Value::as_str)
            .or_else(|| map.get("message").and_then(Value::as_str)),
        Value::String(s) => Some(s.as_str()),
        _ => None,
    }
}
