//! Mirror Error Hierarchy
//!
//! Defines error types for the mirrored map, categorized by where they
//! originate: remote store interaction, configuration, or fatal
//! initialization failures.

use std::time::Duration;

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Remote store interaction failures (load, write, watch)
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Configuration loading or validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Unrecoverable failures requiring the instance not be published
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The remote store rejected or could not serve an operation
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Watch registration was refused by the remote store
    #[error("Watch registration failed: {0}")]
    WatchRegistration(String),

    /// A single remote operation exceeded its time budget
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Retry policy exhaustion
    #[error("Retry budget exhausted after {0} attempts")]
    RetryExhausted(usize),
}
