//! Error types for argonkit operations.
//!
//! This module defines the error hierarchy surfaced to callers. Nothing in
//! this crate retries or recovers silently; every failure reaches the caller
//! with a message naming the field or resource involved.

use thiserror::Error;

/// Result type alias for argonkit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for argonkit operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A required field is missing or a backend reference cannot be used
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Character-to-byte conversion failed
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Reading a stream during materialization failed
    #[error("Consumption error: {message}")]
    Consumption {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Backend discovery resolved zero or several backends
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    /// An encoded hash string does not follow the wire format
    #[error("Malformed encoded hash: {0}")]
    Format(String),

    /// Failure reported by the hashing backend itself
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Backend discovery failures.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Neither the override nor any service provider yielded a backend
    #[error(
        "Could not find a backend. Register a service provider or name a backend type with {0}"
    )]
    NoBackend(&'static str),

    /// More than one distinct backend type was resolved
    #[error("Found more than one backend: [{}]", .0.join(", "))]
    MultipleBackends(Vec<String>),

    /// The override names a type that cannot be instantiated
    #[error("Could not create backend instance from type {name}: {reason}")]
    Override { name: String, reason: String },
}

/// Error raised by a backend implementation.
///
/// Backends report parameter validation failures and internal computation
/// failures through this type. It is propagated to the caller unchanged.
#[derive(Debug, Error)]
#[error("Backend error: {message}")]
pub struct BackendError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl BackendError {
    /// Create a backend error with a descriptive message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create a backend error wrapping an underlying cause.
    pub fn with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// The message describing the failure.
    pub fn message(&self) -> &str {
        &self.message
    }
}
