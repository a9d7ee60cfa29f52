//! Typed outcomes of a remote call.

use std::time::Duration;
use thiserror::Error;

use crate::catalog::CatalogError;

/// Wait applied when a rate-limit response carries no `Retry-After`.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Failure classes the executor distinguishes.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// The operation did not finish within the call deadline
    #[error("API call timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// HTTP 429, with the service's wait hint
    #[error("Rate limited, retry after {}s", .retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    /// HTTP 503
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Any other 5xx
    #[error("Server error: HTTP {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Any other 4xx
    #[error("Client error: HTTP {status} - {message}")]
    ClientError { status: u16, message: String },

    #[error("Failed after {attempts} attempts, last error: {last}")]
    RetriesExhausted { attempts: u32, last: Box<RemoteError> },

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl RemoteError {
    /// The failure that ended the call, unwrapping retry exhaustion.
    pub fn root_cause(&self) -> &RemoteError {
        match self {
            RemoteError::RetriesExhausted { last, .. } => last.root_cause(),
            other => other,
        }
    }
}

impl From<CatalogError> for RemoteError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Status {
                status: 429,
                retry_after,
                ..
            } => RemoteError::RateLimited {
                retry_after: retry_after.unwrap_or(DEFAULT_RETRY_AFTER),
            },
            CatalogError::Status {
                status: 503,
                message,
                ..
            } => RemoteError::ServiceUnavailable(message),
            CatalogError::Status {
                status, message, ..
            } if (500..600).contains(&status) => RemoteError::ServerError { status, message },
            CatalogError::Status {
                status, message, ..
            } if (400..500).contains(&status) => RemoteError::ClientError { status, message },
            other => RemoteError::Unexpected(other.to_string()),
        }
    }
}
