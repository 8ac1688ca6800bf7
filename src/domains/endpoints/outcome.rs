//! Handler results.
//!
//! Every endpoint produces a [`HandlerOutcome`]: either a free-form success
//! payload or a structured [`Failure`]. Untyped JSON (upstream bodies,
//! declarative endpoints) is normalised through [`HandlerOutcome::from_value`].

use http::StatusCode;
use serde_json::{Map, Value};

/// Free-form fields a handler returns alongside its status.
pub type Payload = Map<String, Value>;

/// Default error code when a result does not name one.
pub const DEFAULT_ERROR_CODE: &str = "API_ERROR";

/// Default suggestion attached to failures.
pub const DEFAULT_SUGGESTION: &str = "Check your parameters and try again";

/// Message used when a handler result is not a JSON object.
pub const MALFORMED_RESULT: &str = "malformed handler result";

/// Result of running one endpoint handler.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutcome {
    /// The tool ran; the payload becomes the envelope's `data`.
    Success(Payload),

    /// The tool reported a structured failure.
    Failure(Failure),
}

/// A structured, client-visible failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    /// Human readable message, never empty.
    pub message: String,

    /// Machine readable code.
    pub code: String,

    /// Optional hint for the caller.
    pub suggestion: Option<String>,

    /// HTTP status the dispatcher responds with.
    pub status: StatusCode,

    /// Extra fields kept in the envelope's `data`.
    pub details: Payload,
}

impl Failure {
    /// Create a failure with an explicit code and status.
    pub fn new(message: impl Into<String>, code: impl Into<String>, status: StatusCode) -> Self {
        let mut message = message.into();
        if message.trim().is_empty() {
            message = "Request failed".to_string();
        }
        Self {
            message,
            code: code.into(),
            suggestion: None,
            status,
            details: Payload::new(),
        }
    }

    /// A missing or invalid query parameter.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(message, "INVALID_PARAMETER", StatusCode::BAD_REQUEST)
    }

    /// An unexpected fault inside a handler.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(message, "INTERNAL_ERROR", StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

impl From<Failure> for HandlerOutcome {
    fn from(failure: Failure) -> Self {
        Self::Failure(failure)
    }
}

impl HandlerOutcome {
    /// Build a success from a JSON value.
    ///
    /// Objects become the payload directly; any other value is stored under
    /// `data`.
    pub fn success(value: Value) -> Self {
        match value {
            Value::Object(mut map) => {
                map.remove("success");
                map.remove("error");
                Self::Success(map)
            }
            other => {
                let mut map = Payload::new();
                map.insert("data".to_string(), other);
                Self::Success(map)
            }
        }
    }

    /// Normalise an untyped, duck-typed result object.
    ///
    /// `success` defaults to true unless it is `false` or an `error` is
    /// present without it. `error` may be a string or an object carrying
    /// `message`/`code`/`suggestion`. Non-objects are malformed.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Failure::new(
                MALFORMED_RESULT,
                "MALFORMED_RESULT",
                StatusCode::INTERNAL_SERVER_ERROR,
            )
            .into();
        };

        let success_flag = map.remove("success").and_then(|v| v.as_bool());
        let error = map.remove("error").filter(|e| !e.is_null());

        let succeeded = match success_flag {
            Some(flag) => flag,
            None => error.is_none(),
        };
        if succeeded {
            return Self::Success(map);
        }

        let (message, code, suggestion) = match error {
            Some(Value::String(message)) => (Some(message), None, None),
            Some(Value::Object(block)) => (
                block.get("message").and_then(Value::as_str).map(str::to_string),
                block.get("code").and_then(Value::as_str).map(str::to_string),
                block.get("suggestion").and_then(Value::as_str).map(str::to_string),
            ),
            Some(other) => (Some(other.to_string()), None, None),
            None => (None, None, None),
        };

        let message = message
            .or_else(|| map.get("message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| "Request failed".to_string());

        let mut failure = Failure::new(
            message,
            code.unwrap_or_else(|| DEFAULT_ERROR_CODE.to_string()),
            StatusCode::BAD_REQUEST,
        );
        failure.suggestion = suggestion;
        failure.details = map;
        failure.into()
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Fields destined for the envelope's `data` block.
    pub fn payload(&self) -> &Payload {
        match self {
            Self::Success(payload) => payload,
            Self::Failure(failure) => &failure.details,
        }
    }

    pub fn payload_mut(&mut self) -> &mut Payload {
        match self {
            Self::Success(payload) => payload,
            Self::Failure(failure) => &mut failure.details,
        }
    }

    /// Add a field to the payload (or failure details).
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload_mut().insert(key.into(), value.into());
        self
    }

    /// HTTP status the dispatcher should respond with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Success(_) => StatusCode::OK,
            Self::Failure(failure) => failure.status,
        }
    }

    /// The embedded base64 data-URL image, if this is a successful image result.
    pub fn image_data_url(&self) -> Option<&str> {
        let Self::Success(payload) = self else {
            return None;
        };
        ["image", "image_url", "qr_code"]
            .iter()
            .filter_map(|key| payload.get(*key).and_then(Value::as_str))
            .find(|url| url.starts_with("data:"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_success_defaults_to_true() {
        let outcome = HandlerOutcome::from_value(json!({ "foo": "bar" }));
        assert!(outcome.is_success());
        assert_eq!(outcome.payload()["foo"], "bar");
    }

    #[test]
    fn test_from_value_strips_status_fields() {
        let outcome = HandlerOutcome::from_value(json!({ "success": true, "foo": 1 }));
        assert!(!outcome.payload().contains_key("success"));
    }

    #[test]
    fn test_from_value_string_error() {
        let outcome = HandlerOutcome::from_value(json!({
            "success": false,
            "error": "Text parameter required",
            "example": "/api/tools/hash?text=x"
        }));
        let HandlerOutcome::Failure(failure) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(failure.message, "Text parameter required");
        assert_eq!(failure.code, DEFAULT_ERROR_CODE);
        assert_eq!(failure.details["example"], "/api/tools/hash?text=x");
    }

    #[test]
    fn test_from_value_object_error() {
        let outcome = HandlerOutcome::from_value(json!({
            "success": false,
            "error": { "message": "nope", "code": "X", "suggestion": "try again" }
        }));
        let HandlerOutcome::Failure(failure) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(failure.message, "nope");
        assert_eq!(failure.code, "X");
        assert_eq!(failure.suggestion.as_deref(), Some("try again"));
    }

    #[test]
    fn test_from_value_error_without_flag_is_failure() {
        let outcome = HandlerOutcome::from_value(json!({ "error": "boom" }));
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_from_value_failure_without_message() {
        let outcome = HandlerOutcome::from_value(json!({ "success": false }));
        let HandlerOutcome::Failure(failure) = outcome else {
            panic!("expected failure");
        };
        assert!(!failure.message.is_empty());
    }

    #[test]
    fn test_from_value_malformed() {
        for value in [json!(42), json!("text"), json!([1, 2]), Value::Null] {
            let HandlerOutcome::Failure(failure) = HandlerOutcome::from_value(value) else {
                panic!("expected failure");
            };
            assert_eq!(failure.message, MALFORMED_RESULT);
        }
    }

    #[test]
    fn test_success_wraps_non_objects() {
        let outcome = HandlerOutcome::success(json!([1, 2, 3]));
        assert_eq!(outcome.payload()["data"], json!([1, 2, 3]));
    }

    #[test]
    fn test_image_data_url() {
        let outcome = HandlerOutcome::success(json!({ "image_url": "data:image/png;base64,AAAA" }));
        assert_eq!(outcome.image_data_url(), Some("data:image/png;base64,AAAA"));

        let remote = HandlerOutcome::success(json!({ "image": "https://example.com/a.png" }));
        assert_eq!(remote.image_data_url(), None);
    }
}
