use std::time::Duration;
use thiserror::Error;

/// Failure reported by a catalog source for a single request.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// The service answered with a non-success status.
    #[error("HTTP {status} - {message}")]
    Status {
        status: u16,
        message: String,
        /// Server-supplied wait hint (`Retry-After`), if any
        retry_after: Option<Duration>,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl CatalogError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        CatalogError::Status {
            status,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn rate_limited(retry_after: Option<Duration>) -> Self {
        CatalogError::Status {
            status: 429,
            message: "Too Many Requests".to_string(),
            retry_after,
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => CatalogError::status(status.as_u16(), err.to_string()),
            None => CatalogError::Network(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Parse(err.to_string())
    }
}
