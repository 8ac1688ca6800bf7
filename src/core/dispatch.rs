//! Request dispatcher.
//!
//! Turns one `GET` request into one response:
//!
//! 1. Admin-form paths (`/api/wanga~<token>/...`) are validated first; an
//!    unknown token is a 401 regardless of rate-limit state
//! 2. The endpoint path is looked up; unknown paths are a 404 and consume no budget
//! 3. The request is counted against its tier (free by client IP, admin by token)
//! 4. The handler runs; errors and panics are caught and reported as 500s
//! 5. The outcome is enveloped, or returned as raw image bytes when asked for
//!
//! The dispatcher is transport-agnostic; the HTTP layer only converts
//! [`ApiRequest`] in and [`ApiResponse`] out.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use bytes::Bytes;
use futures::FutureExt;
use http::StatusCode;
use serde_json::{Value, json};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, instrument, warn};

use super::config::Config;
use super::envelope::{Envelope, EnvelopeBuilder, generate_request_id};
use super::rate_limit::{RateDecision, RateTier, TieredRateLimiter};
use super::security::{AdminTokens, parse_admin_path};
use crate::domains::endpoints::{API_PREFIX, EndpointRegistry, Failure, HandlerOutcome, QueryParams};

// ============================================================================
// Request / response
// ============================================================================

/// A decoded API request.
#[derive(Debug, Clone, Default)]
pub struct ApiRequest {
    /// Request path, e.g. `/api/tools/base64`.
    pub path: String,

    pub query: QueryParams,

    /// Client address used as the free-tier rate-limit key.
    pub client: String,

    /// The `Accept` header prefers `image/*` over JSON.
    pub prefers_image: bool,

    /// The `Accept` header admits JSON (or is absent).
    pub accepts_json: bool,
}

impl ApiRequest {
    pub fn new(path: impl Into<String>, query: QueryParams, client: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query,
            client: client.into(),
            prefers_image: false,
            accepts_json: true,
        }
    }

    fn wants_raw_image(&self) -> bool {
        self.prefers_image || self.query.is_truthy("raw")
    }
}

#[derive(Debug, Clone)]
pub enum ResponseBody {
    Json(Envelope),
    Binary { content_type: String, bytes: Bytes },
    Text(String),
}

/// A transport-agnostic response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: ResponseBody,
    pub request_id: String,
    /// Present when the request was counted against a rate-limit tier.
    pub rate_limit: Option<RateDecision>,
}

impl ApiResponse {
    fn json(status: StatusCode, envelope: Envelope, rate_limit: Option<RateDecision>) -> Self {
        Self {
            status,
            request_id: envelope.request_id.clone(),
            body: ResponseBody::Json(envelope),
            rate_limit,
        }
    }

    pub fn envelope(&self) -> Option<&Envelope> {
        match &self.body {
            ResponseBody::Json(envelope) => Some(envelope),
            _ => None,
        }
    }
}

/// Who a request is counted against.
enum Access {
    Free { client: String },
    Admin { token: String },
}

impl Access {
    fn tier(&self) -> RateTier {
        match self {
            Self::Free { .. } => RateTier::Free,
            Self::Admin { .. } => RateTier::Admin,
        }
    }

    fn key(&self) -> &str {
        match self {
            Self::Free { client } => client,
            Self::Admin { token } => token,
        }
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

pub struct Dispatcher {
    registry: Arc<EndpointRegistry>,
    limiter: Arc<TieredRateLimiter>,
    admin_tokens: AdminTokens,
    envelopes: EnvelopeBuilder,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<EndpointRegistry>,
        limiter: Arc<TieredRateLimiter>,
        admin_tokens: AdminTokens,
        envelopes: EnvelopeBuilder,
    ) -> Self {
        Self {
            registry,
            limiter,
            admin_tokens,
            envelopes,
        }
    }

    pub fn from_config(registry: Arc<EndpointRegistry>, config: &Config) -> Self {
        Self::new(
            registry,
            Arc::new(TieredRateLimiter::new(&config.rate_limit)),
            AdminTokens::from_config(&config.admin),
            EnvelopeBuilder::from_config(config),
        )
    }

    pub fn limiter(&self) -> &Arc<TieredRateLimiter> {
        &self.limiter
    }

    pub fn envelopes(&self) -> &EnvelopeBuilder {
        &self.envelopes
    }

    /// Handle one request. Never fails; every fault becomes a response.
    #[instrument(skip_all, fields(path = %request.path))]
    pub async fn dispatch(&self, request: ApiRequest) -> ApiResponse {
        let started = Instant::now();

        let (endpoint_path, access) = match parse_admin_path(&request.path) {
            Some(admin) => {
                if let Err(e) = self.admin_tokens.validate(&admin.token) {
                    warn!("Rejected admin request: {}", e);
                    let failure = Failure::new("Invalid admin token", "INVALID_TOKEN", StatusCode::UNAUTHORIZED)
                        .with_suggestion("Check your admin token or use the public endpoint");
                    return self.failure(failure, &admin.endpoint_path, &request.query, started);
                }
                (admin.endpoint_path, Access::Admin { token: admin.token })
            }
            None => (
                request.path.clone(),
                Access::Free {
                    client: request.client.clone(),
                },
            ),
        };

        let endpoint = match self.registry.resolve(&endpoint_path) {
            Ok(endpoint) => endpoint,
            Err(e) => {
                debug!("{}", e);
                return self.not_found(&request, &endpoint_path, started);
            }
        };

        let tier = access.tier();
        let decision = self.limiter.check(tier, access.key());
        if !decision.allowed {
            warn!("Rate limit exceeded on {} tier for {}", tier, endpoint_path);
            let retry_after = decision.retry_after_secs();
            let failure = Failure::new(
                "Rate limit exceeded",
                "RATE_LIMIT_EXCEEDED",
                StatusCode::TOO_MANY_REQUESTS,
            )
            .with_suggestion(format!("Try again in {} seconds", retry_after))
            .with_detail("retry_after", retry_after)
            .with_detail("rate_limit", rate_limit_block(tier, &decision));
            let envelope = self.envelopes.failure(failure, &endpoint_path, &request.query, started);
            return ApiResponse::json(StatusCode::TOO_MANY_REQUESTS, envelope, Some(decision));
        }

        let handler = endpoint.handler().clone();
        let result = AssertUnwindSafe(handler.handle(&request.query)).catch_unwind().await;
        let mut outcome: HandlerOutcome = match result {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) if e.is_client_error() => Failure::invalid_input(e.to_string()).into(),
            Ok(Err(e)) => {
                error!("Handler for {} failed: {}", endpoint_path, e);
                Failure::internal(format!("Internal server error: {}", e)).into()
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!("Handler for {} panicked: {}", endpoint_path, message);
                Failure::internal(format!("Internal server error: {}", message)).into()
            }
        };

        let raw_image = request
            .wants_raw_image()
            .then(|| outcome.image_data_url().and_then(decode_data_url))
            .flatten();
        if let Some((content_type, bytes)) = raw_image {
            debug!("Returning raw {} ({} bytes)", content_type, bytes.len());
            return ApiResponse {
                status: StatusCode::OK,
                body: ResponseBody::Binary {
                    content_type,
                    bytes: Bytes::from(bytes),
                },
                request_id: generate_request_id(),
                rate_limit: Some(decision),
            };
        }

        let payload = outcome.payload_mut();
        payload.insert("rate_limit".to_string(), rate_limit_block(tier, &decision));
        if tier == RateTier::Admin {
            payload.insert("admin_access".to_string(), Value::Bool(true));
        }

        let status = outcome.status();
        debug!("Completed with {} in {:?}", status, started.elapsed());
        let envelope = self.envelopes.wrap(&outcome, &endpoint_path, &request.query, started);
        ApiResponse::json(status, envelope, Some(decision))
    }

    fn failure(
        &self,
        failure: Failure,
        endpoint_path: &str,
        query: &QueryParams,
        started: Instant,
    ) -> ApiResponse {
        let status = failure.status;
        let envelope = self.envelopes.failure(failure, endpoint_path, query, started);
        ApiResponse::json(status, envelope, None)
    }

    fn not_found(&self, request: &ApiRequest, endpoint_path: &str, started: Instant) -> ApiResponse {
        let is_api = endpoint_path == API_PREFIX || endpoint_path.starts_with("/api/");
        if !is_api && !request.accepts_json {
            return ApiResponse {
                status: StatusCode::NOT_FOUND,
                body: ResponseBody::Text(format!("Cannot GET {}", request.path)),
                request_id: generate_request_id(),
                rate_limit: None,
            };
        }

        let (message, code) = if is_api {
            ("API endpoint not found", "ENDPOINT_NOT_FOUND")
        } else {
            ("Route not found", "NOT_FOUND")
        };
        let available: Vec<&str> = self.registry.paths().collect();
        let failure = Failure::new(message, code, StatusCode::NOT_FOUND)
            .with_suggestion("Visit /api for the list of available endpoints")
            .with_detail("hint", "GET /api lists every endpoint with its parameters")
            .with_detail("available_endpoints", json!(available));
        self.failure(failure, endpoint_path, &request.query, started)
    }
}

fn rate_limit_block(tier: RateTier, decision: &RateDecision) -> Value {
    json!({
        "tier": tier,
        "limit": decision.limit,
        "remaining": decision.remaining,
    })
}

/// Split `data:<mime>;base64,<payload>` into its content type and bytes.
fn decode_data_url(url: &str) -> Option<(String, Vec<u8>)> {
    let (meta, data) = url.strip_prefix("data:")?.split_once(',')?;
    let content_type = meta.strip_suffix(";base64")?;
    let bytes = BASE64_STANDARD.decode(data).ok()?;
    Some((content_type.to_string(), bytes))
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}
