//! Transport layer for the API server.
//!
//! The server speaks plain HTTP (`GET` with query strings) through axum.
//! The transport owns the listener, middleware (CORS, tracing, security
//! headers) and the request/response conversion; everything else is
//! delegated to [`ApiServer`](crate::core::ApiServer).

mod config;
mod error;
pub mod http;

pub use config::HttpConfig;
pub use error::{TransportError, TransportResult};
pub use self::http::HttpTransport;
