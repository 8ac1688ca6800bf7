//! API server state and lifecycle.
//!
//! This module contains the main server handle that owns the endpoint
//! registry and the dispatcher. Transports only hold a clone of it.
//!
//! ## Endpoint Architecture
//!
//! Built-in endpoints are defined in `domains/endpoints/definitions/` with one
//! file per local tool, plus a table of proxy endpoints. Declarative proxy
//! manifests from `ENDPOINTS_DIR` are loaded after them and win on collision.
//! **Adding a new endpoint does NOT require modifying this file!**

use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

use super::config::Config;
use super::dispatch::{ApiRequest, ApiResponse, Dispatcher};
use super::error::Result;
use super::rate_limit::RateTier;
use super::security::ADMIN_SEGMENT_PREFIX;
use crate::domains::endpoints::{API_PREFIX, EndpointRegistry, definitions};
use crate::domains::upstream::UpstreamClient;

/// The main API server handle.
///
/// Cheap to clone; all state is shared.
#[derive(Clone)]
pub struct ApiServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Immutable route table, built once at startup.
    registry: Arc<EndpointRegistry>,

    dispatcher: Arc<Dispatcher>,

    started_at: Instant,
}

impl ApiServer {
    /// Create a new server: builds the upstream client and the registry.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let upstream = Arc::new(UpstreamClient::new(&config.upstream)?);

        let mut builder = definitions::builtin_endpoints(EndpointRegistry::builder(), &upstream);
        if let Some(dir) = &config.endpoints.manifest_dir {
            builder = builder.discover(dir, &upstream);
        }
        let registry = builder.build();

        info!("Upstream API: {}", upstream.base_url());

        Ok(Self::from_parts(config, registry))
    }

    /// Assemble a server from an already built registry.
    pub fn from_parts(config: Config, registry: EndpointRegistry) -> Self {
        let registry = Arc::new(registry);
        let dispatcher = Arc::new(Dispatcher::from_config(registry.clone(), &config));
        Self {
            config: Arc::new(config),
            registry,
            dispatcher,
            started_at: Instant::now(),
        }
    }

    /// Replace the dispatcher, e.g. one whose limiter runs on another clock.
    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = Arc::new(dispatcher);
        self
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn registry(&self) -> &Arc<EndpointRegistry> {
        &self.registry
    }

    /// Handle one API request.
    pub async fn dispatch(&self, request: ApiRequest) -> ApiResponse {
        self.dispatcher.dispatch(request).await
    }

    // ========================================================================
    // Service endpoints
    // ========================================================================

    /// Body of `GET /api`: metadata and every endpoint with its parameters.
    #[instrument(skip(self))]
    pub fn listing(&self) -> Value {
        let api = &self.config.api;
        let by_category = self.registry.by_category();

        let categories: serde_json::Map<String, Value> = by_category
            .iter()
            .map(|(category, endpoints)| (category.to_string(), json!(endpoints.len())))
            .collect();

        let endpoints: Vec<Value> = self
            .registry
            .iter()
            .map(|endpoint| {
                json!({
                    "endpoint": endpoint.path(),
                    "category": endpoint.route().category(),
                    "method": "GET",
                    "description": endpoint.handler().description(),
                    "parameters": endpoint.handler().parameters(),
                    "source": endpoint.source(),
                    "admin_access": admin_form(endpoint.path()),
                })
            })
            .collect();

        let limits = self.dispatcher.limiter();
        let free = limits.limits(RateTier::Free);
        let admin = limits.limits(RateTier::Admin);

        json!({
            "name": api.name,
            "version": api.version,
            "author": api.author,
            "status": api.status,
            "endpoints_count": self.registry.len(),
            "categories": categories,
            "endpoints": endpoints,
            "rate_limits": {
                "free": { "requests": free.max, "window_ms": free.window_ms },
                "admin": { "requests": admin.max, "window_ms": admin.window_ms },
            },
            "documentation": api.documentation,
            "contact": api.contact,
        })
    }

    /// Body of `GET /health`.
    pub fn health(&self) -> Value {
        json!({
            "status": "healthy",
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "uptime": self.started_at.elapsed().as_secs_f64(),
            "version": self.config.api.version,
            "endpoints": self.registry.len(),
        })
    }

    /// Drop expired rate-limit windows. Returns the number removed.
    pub fn sweep_rate_limits(&self) -> usize {
        self.dispatcher.limiter().sweep()
    }
}

/// The admin form of an endpoint path, with a placeholder token.
fn admin_form(path: &str) -> String {
    match path.strip_prefix("/api/") {
        Some(rest) => format!("{}/{}<token>/{}", API_PREFIX, ADMIN_SEGMENT_PREFIX, rest),
        None => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::endpoints::QueryParams;
    use http::StatusCode;

    fn server() -> ApiServer {
        ApiServer::new(Config::default()).unwrap()
    }

    #[test]
    fn test_listing_describes_every_endpoint() {
        let server = server();
        let listing = server.listing();

        assert_eq!(listing["name"], "Megan API");
        assert_eq!(listing["endpoints_count"], server.registry().len());
        let endpoints = listing["endpoints"].as_array().unwrap();
        assert_eq!(endpoints.len(), server.registry().len());

        let base64 = endpoints
            .iter()
            .find(|e| e["endpoint"] == "/api/tools/base64")
            .unwrap();
        assert_eq!(base64["method"], "GET");
        assert_eq!(base64["admin_access"], "/api/wanga~<token>/tools/base64");
        assert!(base64["parameters"]["text"].is_object());

        assert!(listing["categories"]["tools"].as_u64().unwrap() >= 8);
        assert_eq!(listing["rate_limits"]["free"]["requests"], 100);
    }

    #[test]
    fn test_health() {
        let health = server().health();
        assert_eq!(health["status"], "healthy");
        assert!(health["uptime"].as_f64().unwrap() >= 0.0);
        assert!(health["endpoints"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_dispatch_builtin_tool() {
        let server = server();
        let query = QueryParams::from_pairs([("text", "hello")]);
        let response = server
            .dispatch(ApiRequest::new("/api/tools/base64", query, "127.0.0.1"))
            .await;
        assert_eq!(response.status, StatusCode::OK);
        let envelope = response.envelope().unwrap();
        assert_eq!(envelope.data["encoded"], "aGVsbG8=");
    }

    #[tokio::test]
    async fn test_out_of_range_timestamp_is_bad_request() {
        let server = server();
        for raw in ["300000000000000", "-100000000000000"] {
            let query = QueryParams::from_pairs([("timestamp", raw)]);
            let response = server
                .dispatch(ApiRequest::new("/api/time/timestamp", query, "127.0.0.1"))
                .await;
            assert_eq!(response.status, StatusCode::BAD_REQUEST, "{}", raw);
            let envelope = response.envelope().unwrap();
            assert_eq!(envelope.error.as_ref().unwrap().message, "Invalid timestamp");
        }
    }

    #[tokio::test]
    async fn test_injected_dispatcher_controls_rate_window() {
        use crate::core::envelope::EnvelopeBuilder;
        use crate::core::rate_limit::{ManualClock, TieredRateLimiter};
        use crate::core::security::AdminTokens;
        use std::time::Duration;

        let mut config = Config::default();
        config.rate_limit.free.max = 2;
        let server = ApiServer::new(config).unwrap();

        let clock = Arc::new(ManualClock::new());
        let limiter = TieredRateLimiter::with_clock(&server.config().rate_limit, clock.clone());
        let dispatcher = Dispatcher::new(
            server.registry().clone(),
            Arc::new(limiter),
            AdminTokens::from_config(&server.config().admin),
            EnvelopeBuilder::from_config(server.config()),
        );
        let window = Duration::from_millis(server.config().rate_limit.free.window_ms);
        let server = server.with_dispatcher(dispatcher);

        let request = || {
            let query = QueryParams::from_pairs([("text", "hi")]);
            ApiRequest::new("/api/tools/base64", query, "10.0.0.7")
        };
        assert_eq!(server.dispatch(request()).await.status, StatusCode::OK);
        assert_eq!(server.dispatch(request()).await.status, StatusCode::OK);
        assert_eq!(server.dispatch(request()).await.status, StatusCode::TOO_MANY_REQUESTS);

        clock.advance(window + Duration::from_millis(1));
        assert_eq!(server.dispatch(request()).await.status, StatusCode::OK);
    }

    #[test]
    fn test_manifest_directory_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("extra")).unwrap();
        std::fs::write(
            dir.path().join("extra/weather.toml"),
            "upstream = \"/weather\"\nparams = [\"city\"]\nrequired = [\"city\"]\n",
        )
        .unwrap();

        let mut config = Config::default();
        config.endpoints.manifest_dir = Some(dir.path().to_path_buf());
        let server = ApiServer::new(config).unwrap();
        assert!(server.registry().get("/api/extra/weather").is_some());
    }
}
