//! Domain modules.
//!
//! - `endpoints` - route registry, handler traits and all built-in endpoints
//! - `upstream` - client for the upstream API used by proxy endpoints

pub mod endpoints;
pub mod upstream;
