//! Resilient execution of remote catalog calls.

pub mod error;
pub mod executor;

pub use error::{RemoteError, DEFAULT_RETRY_AFTER};
pub use executor::{ApiCallCounter, RemoteCallExecutor, RetryPolicy};
