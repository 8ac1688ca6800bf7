//! Image endpoints under `/api/image/`.
//!
//! `image/flux` has its own handler; `image/firelogo` and `image/image` are
//! plain proxies registered from the proxy table.

pub mod flux;

pub use flux::FluxTool;
