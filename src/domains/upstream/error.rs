//! Upstream failure kinds.

use http::StatusCode;
use std::time::Duration;
use thiserror::Error;

use crate::domains::endpoints::Failure;

/// Errors from a single call to the upstream API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// No response within the configured timeout.
    #[error("Upstream request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// DNS or connection failure.
    #[error("Upstream service unreachable: {0}")]
    Unreachable(String),

    /// The upstream answered with a non-2xx status.
    #[error("Upstream returned HTTP {status}")]
    Status { status: u16, body: Option<String> },

    /// The body could not be read or decoded.
    #[error("Upstream returned an unreadable response: {0}")]
    BadResponse(String),

    /// The request could not be built or sent.
    #[error("Upstream request failed: {0}")]
    Request(String),

    /// The HTTP client could not be constructed.
    #[error("Failed to build upstream client: {0}")]
    Client(String),
}

impl UpstreamError {
    /// Classify a reqwest error.
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if err.is_connect() {
            Self::Unreachable(err.to_string())
        } else if err.is_decode() || err.is_body() {
            Self::BadResponse(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }

    /// Machine readable code reported in the envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "UPSTREAM_TIMEOUT",
            Self::Unreachable(_) => "UPSTREAM_UNREACHABLE",
            Self::Status { .. } => "UPSTREAM_STATUS",
            Self::BadResponse(_) => "UPSTREAM_BAD_RESPONSE",
            Self::Request(_) | Self::Client(_) => "UPSTREAM_REQUEST_FAILED",
        }
    }

    /// HTTP status the dispatcher responds with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        }
    }

    /// Convert into a client-visible failure.
    pub fn into_failure(self) -> Failure {
        let mut failure = Failure::new(self.to_string(), self.code(), self.status())
            .with_suggestion("The upstream service failed; try again later");
        if let Self::Status { status, body } = self {
            failure = failure.with_detail("upstream_status", status);
            if let Some(body) = body {
                failure = failure.with_detail("upstream_body", body);
            }
        }
        failure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_statuses() {
        let timeout = UpstreamError::Timeout(Duration::from_secs(15));
        assert_eq!(timeout.code(), "UPSTREAM_TIMEOUT");
        assert_eq!(timeout.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(timeout.to_string(), "Upstream request timed out after 15000ms");

        let status = UpstreamError::Status {
            status: 500,
            body: None,
        };
        assert_eq!(status.code(), "UPSTREAM_STATUS");
        assert_eq!(status.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_into_failure_keeps_upstream_status() {
        let failure = UpstreamError::Status {
            status: 404,
            body: Some("missing".to_string()),
        }
        .into_failure();
        assert_eq!(failure.code, "UPSTREAM_STATUS");
        assert_eq!(failure.details["upstream_status"], 404);
        assert_eq!(failure.details["upstream_body"], "missing");
    }
}
