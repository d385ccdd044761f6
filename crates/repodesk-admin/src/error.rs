//! Errors raised while talking to the backend

use repodesk_core::FieldErrors;
use std::collections::BTreeMap;
use thiserror::Error;

/// Result type alias for backend operations
pub type ApiResult<T> = Result<T, ApiError>;

/// How a failure is presented to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A read failed; shown inline and retried on the next trigger
    TransientFetch,
    /// A create/update was rejected with field-level messages
    Validation,
    /// Anything else; shown as a generic notification, operation not applied
    Unexpected,
}

/// Errors that can occur while calling the backend
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure: connection refused, timeout, TLS, ...
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status without field errors
    #[error("API returned {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Message from the body, or the status reason
        message: String,
    },

    /// Create/update rejected with field-level messages
    #[error("Validation failed for {}", field_list(.0))]
    Validation(FieldErrors),

    /// Response body did not have the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The request could not be built
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Error message
        message: String,
    },
}

fn field_list(errors: &FieldErrors) -> String {
    errors.keys().cloned().collect::<Vec<_>>().join(", ")
}

impl ApiError {
    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Classify the failure for presentation
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Http(err) if err.is_timeout() || err.is_connect() => ErrorKind::TransientFetch,
            Self::Status { status, .. } if *status == 429 || *status >= 500 => {
                ErrorKind::TransientFetch
            }
            _ => ErrorKind::Unexpected,
        }
    }

    /// First message for every rejected field, empty for other errors
    pub fn first_messages(&self) -> BTreeMap<String, String> {
        match self {
            Self::Validation(errors) => first_messages(errors),
            _ => BTreeMap::new(),
        }
    }
}

/// Reduce backend field errors to the first message per field
pub fn first_messages(errors: &FieldErrors) -> BTreeMap<String, String> {
    errors
        .iter()
        .filter_map(|(field, messages)| {
            messages
                .first()
                .map(|message| (field.clone(), message.clone()))
        })
        .collect()
}
