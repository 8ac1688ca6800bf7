//! Endpoint handler traits.
//!
//! The dispatcher only knows [`EndpointHandler`]: an async function from
//! query parameters to a [`HandlerOutcome`]. Built-in tools implement the
//! typed [`Endpoint`] trait instead and are adapted through [`TypedEndpoint`],
//! which parses the query into the tool's parameter struct.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::EndpointError;
use super::outcome::HandlerOutcome;
use super::query::QueryParams;

// ============================================================================
// Dispatcher-facing handler
// ============================================================================

/// A callable API endpoint.
#[async_trait]
pub trait EndpointHandler: Send + Sync {
    /// One-line description shown in the `/api` listing.
    fn description(&self) -> &str;

    /// JSON description of accepted query parameters.
    fn parameters(&self) -> Value;

    /// Run the endpoint.
    ///
    /// `Err(EndpointError::InvalidArguments)` is reported as a 400 failure;
    /// any other error becomes a 500 "Internal server error" envelope.
    async fn handle(&self, query: &QueryParams) -> Result<HandlerOutcome, EndpointError>;
}

// ============================================================================
// Typed endpoint definitions
// ============================================================================

/// A built-in endpoint with a typed parameter struct.
#[async_trait]
pub trait Endpoint: Send + Sync + 'static {
    /// Route category, the first path segment after `/api/`.
    const CATEGORY: &'static str;

    /// Endpoint name, the second path segment.
    const NAME: &'static str;

    /// Description shown to clients.
    const DESCRIPTION: &'static str;

    /// Query parameters, deserialized from the request's query string.
    type Params: DeserializeOwned + JsonSchema + Send;

    async fn execute(&self, params: Self::Params) -> Result<HandlerOutcome, EndpointError>;
}

/// Adapts an [`Endpoint`] to the [`EndpointHandler`] interface.
pub struct TypedEndpoint<E> {
    inner: E,
}

impl<E: Endpoint> TypedEndpoint<E> {
    pub fn new(inner: E) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<E: Endpoint> EndpointHandler for TypedEndpoint<E> {
    fn description(&self) -> &str {
        E::DESCRIPTION
    }

    fn parameters(&self) -> Value {
        let schema = schemars::schema_for!(E::Params);
        let schema = serde_json::to_value(schema).unwrap_or(Value::Null);
        schema.get("properties").cloned().unwrap_or_else(|| Value::Object(Default::default()))
    }

    async fn handle(&self, query: &QueryParams) -> Result<HandlerOutcome, EndpointError> {
        let params: E::Params = query
            .deserialize()
            .map_err(|e| EndpointError::invalid_arguments(format!("Invalid query parameters: {}", e)))?;
        self.inner.execute(params).await
    }
}

/// Return the value when present and non-blank, else an invalid-arguments error.
pub fn required<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str, EndpointError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| EndpointError::invalid_arguments(message))
}
