//! Upstream domain module.
//!
//! Proxy endpoints forward their query parameters to one path of the
//! upstream API and hand back its body as a [`HandlerOutcome`]. Transport
//! faults never escape as errors; they are reported as failures whose code
//! names the kind of fault.
//!
//! [`HandlerOutcome`]: crate::domains::endpoints::HandlerOutcome

mod client;
mod error;

pub use client::UpstreamClient;
pub use error::UpstreamError;
