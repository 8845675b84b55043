//! Error taxonomy for the console core.
//!
//! Transport failures are `ApiError`; everything a workbench action can
//! surface (transport plus local validation) is `ConsoleError`. Polling
//! errors are logged and swallowed by the poller itself, so they never
//! reach the user.

use reqwest::StatusCode;
use thiserror::Error;

use crate::models::OrderStatus;

pub type ApiResult<T> = Result<T, ApiError>;

/// A failed call against the admin backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Cannot reach the admin backend at {url}")]
    Unreachable { url: String },

    #[error("Connection to {url} timed out")]
    Timeout { url: String },

    #[error("Invalid admin backend URL: {url}")]
    InvalidUrl { url: String },

    /// Bearer token rejected. Raising this also invalidates the session;
    /// re-login is the shell's responsibility.
    #[error("Session expired or token rejected")]
    Unauthorized,

    #[error("Order not found")]
    NotFound,

    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },

    #[error("Invalid response from the admin backend: {0}")]
    InvalidResponse(String),

    #[error("Failed to set up HTTP client: {0}")]
    Setup(String),

    #[error("Network error communicating with {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ApiError {
    /// Map a transport-level `reqwest` failure onto the taxonomy.
    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_connect() {
            return ApiError::Unreachable {
                url: url.to_string(),
            };
        }
        if err.is_timeout() {
            return ApiError::Timeout {
                url: url.to_string(),
            };
        }
        if err.is_builder() {
            return ApiError::InvalidUrl {
                url: url.to_string(),
            };
        }
        ApiError::Network {
            url: url.to_string(),
            source: err,
        }
    }

    /// Map a non-success HTTP status onto the taxonomy, preferring the
    /// backend's own error message when it sent one.
    pub(crate) fn from_status(status: StatusCode, message: Option<String>) -> Self {
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            404 => ApiError::NotFound,
            s => ApiError::Status {
                status: s,
                message: message.unwrap_or_else(|| default_status_message(status)),
            },
        }
    }

    /// Whether retrying the same call later could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Unreachable { .. } | ApiError::Timeout { .. } | ApiError::Network { .. } => {
                true
            }
            ApiError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

fn default_status_message(status: StatusCode) -> String {
    match status.as_u16() {
        403 => "Not authorized for this store".to_string(),
        s if s >= 500 => "Admin backend server error".to_string(),
        _ => "Unexpected response from the admin backend".to_string(),
    }
}

/// Anything a workbench action can fail with: a backend error, or a local
/// validation rejection that never produced a network call.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("transition from {from} to {to} is not offered for this order")]
    TransitionNotOffered { from: OrderStatus, to: OrderStatus },

    #[error("staff name is required")]
    MissingStaffName,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_recognizes_auth_and_not_found() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, None),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, None),
            ApiError::NotFound
        ));
    }

    #[test]
    fn backend_message_wins_over_default_text() {
        let err = ApiError::from_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            Some("status transition not allowed".to_string()),
        );
        assert_eq!(
            err.to_string(),
            "status transition not allowed (HTTP 422)"
        );
    }

    #[test]
    fn server_errors_and_backpressure_are_transient() {
        assert!(ApiError::from_status(StatusCode::SERVICE_UNAVAILABLE, None).is_transient());
        assert!(ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, None).is_transient());
        assert!(!ApiError::from_status(StatusCode::FORBIDDEN, None).is_transient());
        assert!(!ApiError::Unauthorized.is_transient());
    }
}
