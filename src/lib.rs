//! Megan API Library
//!
//! This crate provides an HTTP toolbox API: a registry of small utility
//! endpoints (encoders, validators, generators) and thin proxies to an
//! upstream media/AI API, behind one response envelope, a two-tier rate
//! limiter and admin-token access.
//!
//! # Architecture
//!
//! The server is organized into the following modules:
//!
//! - **core**: Core infrastructure including configuration, error handling,
//!   envelope, rate limiting, dispatch and the HTTP transport
//! - **domains**: Business logic organized by bounded contexts
//!   - **endpoints**: Route registry, handler traits and built-in endpoints
//!   - **upstream**: Client for the upstream API used by proxy endpoints
//!
//! # Example
//!
//! ```rust,no_run
//! use megan_api::core::{ApiServer, Config, HttpTransport};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let transport = HttpTransport::new(config.transport.clone());
//!     let server = ApiServer::new(config)?;
//!     transport.run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use self::core::{ApiServer, Config, Error, Result};
