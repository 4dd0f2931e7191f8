//! Error types for the Unbound webhook
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for webhook operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the Unbound webhook
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (missing or malformed settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A domain filter pattern failed to compile
    #[error("Invalid domain filter pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Compiler error
        #[source]
        source: regex::Error,
    },

    /// The resolver could not be reached while listing records
    #[error("Resolver unavailable: {0}")]
    UpstreamUnavailable(String),

    /// A single resolver operation failed while applying a change set
    #[error("Failed to {action} record {name} {record_type} {value}: {message}")]
    ApplyFailed {
        /// Operation kind (CREATE or REMOVE)
        action: String,
        /// Record name
        name: String,
        /// Record type
        record_type: String,
        /// Record value
        value: String,
        /// Underlying resolver error
        message: String,
    },

    /// Resolver rejected a command
    #[error("Resolver error: {0}")]
    Resolver(String),

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an upstream-unavailable error
    pub fn upstream_unavailable(msg: impl Into<String>) -> Self {
        Self::UpstreamUnavailable(msg.into())
    }

    /// Create a resolver error
    pub fn resolver(msg: impl Into<String>) -> Self {
        Self::Resolver(msg.into())
    }
}
