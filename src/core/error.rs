//! Error types and handling for the API server.
//!
//! This module defines a unified error type that can represent errors from
//! all domains and external dependencies, providing consistent error handling
//! across the entire application.

use thiserror::Error;

/// A specialized Result type for API server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the API server.
///
/// Request-level failures never surface as this type; they are converted to
/// envelopes by the dispatcher. This covers startup and infrastructure faults.
#[derive(Debug, Error)]
pub enum Error {
    /// Error originating from the endpoints domain.
    #[error("Endpoint error: {0}")]
    Endpoint(#[from] crate::domains::endpoints::EndpointError),

    /// Error originating from the upstream proxy client.
    #[error("Upstream error: {0}")]
    Upstream(#[from] crate::domains::upstream::UpstreamError),

    /// Error originating from the HTTP transport.
    #[error("Transport error: {0}")]
    Transport(#[from] super::transport::TransportError),

    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors from file operations or network communication.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
