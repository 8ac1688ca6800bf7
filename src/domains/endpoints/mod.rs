//! Endpoints domain module.
//!
//! This module handles every `/api/<category>/<name>` route: local tools
//! that compute a result in-process and proxies that forward one request to
//! the upstream API.
//!
//! ## Architecture
//!
//! - `definitions/` - Built-in endpoints (one file per local tool) and the proxy table
//! - `handlers.rs` - `EndpointHandler` / typed `Endpoint` traits
//! - `outcome.rs` - `HandlerOutcome` and `Failure`
//! - `proxy.rs` - Declarative proxy endpoints and `*.toml` manifests
//! - `registry.rs` - Route paths, registry builder and manifest discovery
//! - `error.rs` - Endpoint-specific error types

pub mod definitions;
mod error;
mod handlers;
mod outcome;
mod proxy;
mod query;
mod registry;

pub use error::EndpointError;
pub use handlers::{Endpoint, EndpointHandler, TypedEndpoint, required};
pub use outcome::{
    DEFAULT_ERROR_CODE, DEFAULT_SUGGESTION, Failure, HandlerOutcome, MALFORMED_RESULT, Payload,
};
pub use proxy::{ProxyEndpoint, ProxySpec};
pub use query::QueryParams;
pub use registry::{
    API_PREFIX, EndpointRegistry, EndpointSource, RegisteredEndpoint, RegistryBuilder, RoutePath,
};
