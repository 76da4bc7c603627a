//! # Pool Error Types
//!
//! All errors the pooler reports to calling code.
//!
//! Stale handles found in an inactive set are not errors: they are
//! discarded silently and never reach the caller.

use thiserror::Error;

/// Errors that can occur while pooling.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The instance was never created by this pooler, or the pooler has
    /// been torn down since.
    #[error("instance is not managed by any pool: {0}")]
    NotPooled(String),

    /// The host engine could not create an instance for the key.
    #[error("host failed to create an instance for key {0}")]
    CreationFailed(String),

    /// A typed view was requested on an instance that lacks it.
    #[error("instance {instance} has no {capability} capability")]
    MissingCapability {
        /// The instance that was queried.
        instance: String,
        /// Type name of the missing capability.
        capability: &'static str,
    },

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;
