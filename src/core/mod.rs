//! Core module containing shared infrastructure components.
//!
//! This module provides the foundational building blocks for the API server,
//! including error handling, configuration, the response envelope, rate
//! limiting, request dispatch, server lifecycle and the HTTP transport.

pub mod config;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod rate_limit;
pub mod security;
pub mod server;
pub mod transport;

pub use config::Config;
pub use dispatch::{ApiRequest, ApiResponse, Dispatcher, ResponseBody};
pub use envelope::{Envelope, EnvelopeBuilder};
pub use error::{Error, Result};
pub use server::ApiServer;
pub use transport::{HttpConfig, HttpTransport};
