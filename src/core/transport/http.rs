//! HTTP transport implementation.
//!
//! axum server exposing every registered endpoint as `GET /api/...`, plus
//! `GET /api` (listing) and `GET /health`. Admin-form paths and unknown
//! routes go through the fallback, which hands them to the dispatcher too.

use axum::{
    Json, Router,
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use super::{HttpConfig, TransportError, TransportResult};
use crate::core::dispatch::{ApiRequest, ApiResponse, ResponseBody};
use crate::core::server::ApiServer;
use crate::domains::endpoints::{API_PREFIX, QueryParams};

const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");
const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        self.config.address()
    }

    /// Build the router for `server`.
    pub fn router(&self, server: ApiServer) -> TransportResult<Router> {
        let mut router = Router::new()
            .route("/health", get(health_check))
            .route(API_PREFIX, get(api_listing));

        for path in server.registry().paths() {
            router = router.route(path, get(handle_api));
        }

        let mut router = router
            .fallback(handle_fallback)
            .with_state(server)
            .layer(cors_layer(&self.config.cors_origin)?)
            .layer(TraceLayer::new_for_http());

        if self.config.security_headers {
            router = router
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("SAMEORIGIN"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::REFERRER_POLICY,
                    HeaderValue::from_static("no-referrer"),
                ));
        }

        Ok(router)
    }

    /// Run the HTTP transport until SIGINT/SIGTERM.
    pub async fn run(self, server: ApiServer) -> TransportResult<()> {
        let addr = self.address();
        let app = self.router(server.clone())?;

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        info!(
            "Ready - listening on {} ({} endpoints, CORS origin {:?})",
            addr,
            server.registry().len(),
            self.config.cors_origin
        );
        info!("  → Listing: GET {}", API_PREFIX);
        info!("  → Health:  GET /health");

        let sweeper = spawn_sweeper(server, Duration::from_secs(self.config.sweep_interval_secs.max(1)));

        let result = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| TransportError::http(e.to_string()));

        sweeper.abort();
        result
    }
}

fn cors_layer(origin: &str) -> TransportResult<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    if origin.trim() == "*" {
        return Ok(layer.allow_origin(Any));
    }

    let origins = origin
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(|o| {
            HeaderValue::from_str(o)
                .map_err(|_| TransportError::config(format!("Invalid CORS origin: {:?}", o)))
        })
        .collect::<TransportResult<Vec<_>>>()?;
    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}

fn spawn_sweeper(server: ApiServer, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = server.sweep_rate_limits();
            if removed > 0 {
                debug!("Swept {} expired rate-limit windows", removed);
            }
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint.
async fn health_check(State(server): State<ApiServer>) -> impl IntoResponse {
    Json(server.health())
}

/// API listing endpoint.
async fn api_listing(State(server): State<ApiServer>) -> impl IntoResponse {
    Json(server.listing())
}

/// Every registered endpoint.
async fn handle_api(State(server): State<ApiServer>, request: Request) -> Response {
    let api_request = api_request(&request, server.config().rate_limit.trust_forwarded_for);
    server.dispatch(api_request).await.into_response()
}

/// Admin-form paths and unknown routes.
async fn handle_fallback(State(server): State<ApiServer>, request: Request) -> Response {
    if request.method() != Method::GET && request.method() != Method::HEAD {
        return (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed").into_response();
    }
    handle_api(State(server), request).await
}

fn api_request(request: &Request, trust_forwarded_for: bool) -> ApiRequest {
    let headers = request.headers();
    let (prefers_image, accepts_json) = negotiate(headers);
    ApiRequest {
        path: request.uri().path().to_string(),
        query: QueryParams::parse(request.uri().query()),
        client: client_ip(
            headers,
            request.extensions().get::<ConnectInfo<SocketAddr>>(),
            trust_forwarded_for,
        ),
        prefers_image,
        accepts_json,
    }
}

/// Client address: the first `X-Forwarded-For` hop when trusted, otherwise
/// the peer address.
fn client_ip(
    headers: &HeaderMap,
    peer: Option<&ConnectInfo<SocketAddr>>,
    trust_forwarded_for: bool,
) -> String {
    if trust_forwarded_for {
        let forwarded = headers
            .get(&X_FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }
    peer.map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Returns `(prefers_image, accepts_json)` from the `Accept` header.
///
/// An image is preferred only when some `image/*` type has a strictly higher
/// quality than both JSON and HTML, so browser navigation still gets JSON.
fn negotiate(headers: &HeaderMap) -> (bool, bool) {
    let Some(accept) = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()) else {
        return (false, true);
    };

    let mut image_q = 0.0_f32;
    let mut json_q = 0.0_f32;
    let mut html_q = 0.0_f32;
    for item in accept.split(',') {
        let mut parts = item.split(';');
        let media = parts.next().unwrap_or("").trim().to_ascii_lowercase();
        let q = parts
            .filter_map(|p| p.trim().strip_prefix("q="))
            .find_map(|q| q.trim().parse::<f32>().ok())
            .unwrap_or(1.0);

        match media.as_str() {
            "*/*" => json_q = json_q.max(q),
            "application/json" | "application/*" => json_q = json_q.max(q),
            "text/html" => html_q = html_q.max(q),
            m if m.starts_with("image/") => image_q = image_q.max(q),
            _ => {}
        }
    }

    (image_q > json_q.max(html_q), json_q > 0.0)
}

// ============================================================================
// Response conversion
// ============================================================================

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let mut response = match self.body {
            ResponseBody::Json(envelope) => (self.status, Json(envelope)).into_response(),
            ResponseBody::Binary {
                content_type,
                bytes,
            } => {
                let content_type = HeaderValue::from_str(&content_type)
                    .unwrap_or(HeaderValue::from_static("application/octet-stream"));
                (self.status, [(header::CONTENT_TYPE, content_type)], bytes).into_response()
            }
            ResponseBody::Text(text) => (self.status, text).into_response(),
        };

        let headers = response.headers_mut();
        if let Ok(id) = HeaderValue::from_str(&self.request_id) {
            headers.insert(X_REQUEST_ID, id);
        }
        if let Some(decision) = self.rate_limit {
            headers.insert(RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
            headers.insert(RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
            headers.insert(RATELIMIT_RESET, HeaderValue::from(decision.retry_after_secs()));
            if !decision.allowed {
                headers.insert(header::RETRY_AFTER, HeaderValue::from(decision.retry_after_secs()));
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{Config, TierLimits};
    use axum::body::Body;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    fn app(config: Config) -> Router {
        let transport = HttpTransport::new(config.transport.clone());
        transport.router(ApiServer::new(config).unwrap()).unwrap()
    }

    fn get(uri: &str) -> axum::http::Request<Body> {
        axum::http::Request::get(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_tool_request_has_envelope_and_headers() {
        let response = app(Config::default())
            .oneshot(get("/api/tools/base64?text=hello"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert!(headers.contains_key("x-request-id"));
        assert_eq!(headers["ratelimit-limit"], "100");
        assert_eq!(headers["ratelimit-remaining"], "99");
        assert_eq!(headers["x-content-type-options"], "nosniff");

        let request_id = headers["x-request-id"].to_str().unwrap().to_string();
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["encoded"], "aGVsbG8=");
        assert_eq!(body["request_id"], request_id);
    }

    #[tokio::test]
    async fn test_unknown_api_route_is_404_envelope() {
        let response = app(Config::default())
            .oneshot(get("/api/does/not/exist"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(!response.headers().contains_key("ratelimit-limit"));

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["message"], "API endpoint not found");
        assert!(body["data"]["available_endpoints"].as_array().unwrap().len() > 10);
    }

    #[tokio::test]
    async fn test_rate_limit_returns_429_with_retry_after() {
        let mut config = Config::default();
        config.rate_limit.free = TierLimits::new(1, Duration::from_secs(60));
        let app = app(config);

        let first = app.clone().oneshot(get("/api/tools/uuid")).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app.oneshot(get("/api/tools/uuid")).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(second.headers().contains_key(header::RETRY_AFTER));
        let body = body_json(second).await;
        assert_eq!(body["error"]["code"], "RATE_LIMIT_EXCEEDED");
    }

    #[tokio::test]
    async fn test_admin_path_through_fallback() {
        let mut config = Config::default();
        config.admin.tokens = vec!["s3cret".to_string()];
        let app = app(config);

        let ok = app
            .clone()
            .oneshot(get("/api/wanga~s3cret/tools/base64?text=hi"))
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(ok.headers()["ratelimit-limit"], "10000");
        let body = body_json(ok).await;
        assert_eq!(body["data"]["admin_access"], true);

        let denied = app
            .oneshot(get("/api/wanga~wrong/tools/base64?text=hi"))
            .await
            .unwrap();
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(denied).await;
        assert_eq!(body["error"]["code"], "INVALID_TOKEN");
    }

    #[test]
    fn test_health_and_listing_are_not_throttled() {
        let mut config = Config::default();
        config.rate_limit.free = TierLimits::new(1, Duration::from_secs(60));
        let app = app(config);

        tokio_test::block_on(async {
            for _ in 0..3 {
                let health = app.clone().oneshot(get("/health")).await.unwrap();
                assert_eq!(health.status(), StatusCode::OK);
                assert_eq!(body_json(health).await["status"], "healthy");

                let listing = app.clone().oneshot(get("/api")).await.unwrap();
                assert_eq!(listing.status(), StatusCode::OK);
                assert!(listing.headers().get("ratelimit-limit").is_none());
            }
        });
    }

    #[tokio::test]
    async fn test_non_api_path_plain_text_for_browsers() {
        let request = axum::http::Request::get("/nope")
            .header(header::ACCEPT, "text/html")
            .body(Body::empty())
            .unwrap();
        let response = app(Config::default()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"Cannot GET /nope");
    }

    #[tokio::test]
    async fn test_cors_headers() {
        let request = axum::http::Request::get("/health")
            .header(header::ORIGIN, "https://example.com")
            .body(Body::empty())
            .unwrap();
        let response = app(Config::default()).oneshot(request).await.unwrap();
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[test]
    fn test_invalid_cors_origin_is_config_error() {
        assert!(cors_layer("https://ok.example, bad\norigin").is_err());
        assert!(cors_layer("https://a.example,https://b.example").is_ok());
    }

    #[test]
    fn test_negotiate() {
        let accept = |value: &str| {
            let mut headers = HeaderMap::new();
            headers.insert(header::ACCEPT, HeaderValue::from_str(value).unwrap());
            negotiate(&headers)
        };

        assert_eq!(negotiate(&HeaderMap::new()), (false, true));
        assert_eq!(accept("application/json"), (false, true));
        assert_eq!(accept("image/png"), (true, false));
        assert_eq!(accept("image/webp,*/*;q=0.8"), (true, true));
        assert_eq!(
            accept("text/html,application/xhtml+xml,image/webp,*/*;q=0.8"),
            (false, true)
        );
        assert_eq!(accept("application/json, image/*;q=0.5"), (false, true));
    }

    #[test]
    fn test_client_ip() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        let peer = ConnectInfo(SocketAddr::from(([192, 168, 1, 2], 4000)));

        assert_eq!(client_ip(&headers, Some(&peer), true), "203.0.113.7");
        assert_eq!(client_ip(&headers, Some(&peer), false), "192.168.1.2");
        assert_eq!(client_ip(&HeaderMap::new(), Some(&peer), true), "192.168.1.2");
        assert_eq!(client_ip(&HeaderMap::new(), None, false), "unknown");
    }
}
