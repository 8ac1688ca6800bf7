//! Endpoint-specific error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while registering or running endpoints.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// The requested endpoint was not found.
    #[error("Endpoint not found: {0}")]
    NotFound(String),

    /// Invalid query parameters were provided to the endpoint.
    ///
    /// The dispatcher reports these to the client as a 400 failure rather
    /// than an internal error.
    #[error("{0}")]
    InvalidArguments(String),

    /// The endpoint execution failed.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// A route segment or manifest-derived path is not usable.
    #[error("Invalid route '{route}': {reason}")]
    InvalidRoute { route: String, reason: String },

    /// A proxy manifest could not be loaded.
    #[error("Invalid manifest {}: {message}", path.display())]
    Manifest { path: PathBuf, message: String },
}

impl EndpointError {
    /// Create a new "not found" error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create a new "invalid arguments" error.
    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Create a new "execution failed" error.
    pub fn execution_failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }

    pub fn invalid_route(route: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRoute {
            route: route.into(),
            reason: reason.into(),
        }
    }

    pub fn manifest(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Manifest {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether the caller, not the handler, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidArguments(_))
    }
}
