//! Response envelope.
//!
//! Every `/api/...` response body, success or failure, is one [`Envelope`]:
//!
//! ```json
//! {
//!   "success": true,
//!   "status": "success",
//!   "results": 1,
//!   "timestamp": "2025-01-01T00:00:00+00:00",
//!   "request_id": "req_1735689600000_k3j9x0a1b",
//!   "api": { "name": "Megan API", "version": "2.0.0", "status": "active" },
//!   "data": { ... },
//!   "error": { "message": "...", "code": "...", "suggestion": "..." },
//!   "request": { "endpoint": "tools/base64", "query": { ... }, "response_time": "3ms" }
//! }
//! ```
//!
//! `data` is always present. `error` is present exactly when `success` is
//! false. `request` is only echoed when enabled in the configuration.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

use super::config::Config;
use crate::domains::endpoints::{
    API_PREFIX, DEFAULT_SUGGESTION, Failure, HandlerOutcome, Payload, QueryParams,
};

const REQUEST_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const REQUEST_ID_SUFFIX_LEN: usize = 9;

/// Payload fields scanned, in order, for an array to count as `results`.
const RESULT_ARRAY_FIELDS: [&str; 3] = ["results", "data", "items"];

// ============================================================================
// Envelope types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Success,
    Error,
}

/// API identification block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMeta {
    pub name: String,
    pub version: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBlock {
    pub message: String,
    pub code: String,
    pub suggestion: String,
}

/// Echo of the request, for debugging clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEcho {
    pub endpoint: String,
    pub query: QueryParams,
    pub response_time: String,
}

/// The canonical response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    pub status: EnvelopeStatus,
    pub results: usize,
    pub timestamp: String,
    pub request_id: String,
    pub api: ApiMeta,
    pub data: Payload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestEcho>,
}

// ============================================================================
// Builder
// ============================================================================

/// Wraps handler outcomes into envelopes.
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    api: ApiMeta,
    echo_request: bool,
}

impl EnvelopeBuilder {
    pub fn new(api: ApiMeta, echo_request: bool) -> Self {
        Self { api, echo_request }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            ApiMeta {
                name: config.api.name.clone(),
                version: config.api.version.clone(),
                status: config.api.status.clone(),
            },
            config.envelope.echo_request,
        )
    }

    /// Wrap an outcome.
    ///
    /// `endpoint` is the resolved route path (never the admin form, so a
    /// token is never echoed back). Never fails.
    pub fn wrap(
        &self,
        outcome: &HandlerOutcome,
        endpoint: &str,
        query: &QueryParams,
        started: Instant,
    ) -> Envelope {
        let data = outcome.payload().clone();
        let error = match outcome {
            HandlerOutcome::Success(_) => None,
            HandlerOutcome::Failure(failure) => Some(error_block(failure)),
        };
        let success = error.is_none();

        Envelope {
            success,
            status: if success {
                EnvelopeStatus::Success
            } else {
                EnvelopeStatus::Error
            },
            results: count_results(&data),
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id: generate_request_id(),
            api: self.api.clone(),
            data,
            error,
            request: self.echo_request.then(|| RequestEcho {
                endpoint: echo_endpoint(endpoint),
                query: query.clone(),
                response_time: format!("{}ms", started.elapsed().as_millis()),
            }),
        }
    }

    /// Shorthand for wrapping a bare failure.
    pub fn failure(
        &self,
        failure: Failure,
        endpoint: &str,
        query: &QueryParams,
        started: Instant,
    ) -> Envelope {
        self.wrap(&HandlerOutcome::Failure(failure), endpoint, query, started)
    }
}

fn error_block(failure: &Failure) -> ErrorBlock {
    ErrorBlock {
        message: failure.message.clone(),
        code: failure.code.clone(),
        suggestion: failure
            .suggestion
            .clone()
            .unwrap_or_else(|| DEFAULT_SUGGESTION.to_string()),
    }
}

fn echo_endpoint(path: &str) -> String {
    path.strip_prefix(API_PREFIX)
        .map(|rest| rest.trim_start_matches('/'))
        .unwrap_or(path)
        .to_string()
}

/// Length of the first array among `results`, `data`, `items`; otherwise 1
/// for a non-empty payload and 0 for an empty one.
pub fn count_results(data: &Payload) -> usize {
    RESULT_ARRAY_FIELDS
        .iter()
        .find_map(|key| data.get(*key).and_then(Value::as_array))
        .map(Vec::len)
        .unwrap_or(usize::from(!data.is_empty()))
}

/// `req_<unix millis>_<9 random base36 chars>`.
pub fn generate_request_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..REQUEST_ID_SUFFIX_LEN)
        .map(|_| REQUEST_ID_ALPHABET[rng.gen_range(0..REQUEST_ID_ALPHABET.len())] as char)
        .collect();
    format!("req_{}_{}", chrono::Utc::now().timestamp_millis(), suffix)
}
