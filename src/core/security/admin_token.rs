use std::collections::HashSet;

use crate::core::config::AdminConfig;
use crate::domains::endpoints::API_PREFIX;

/// Path segment prefix that marks an admin request: `/api/wanga~<token>/...`.
pub const ADMIN_SEGMENT_PREFIX: &str = "wanga~";

const ENCODED_ADMIN_SEGMENT_PREFIXES: [&str; 2] = ["wanga%7E", "wanga%7e"];

/// Errors that can occur during admin token validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdminTokenError {
    #[error("Admin token is missing")]
    Missing,

    #[error("Admin token is not recognised")]
    Unknown,
}

/// An admin-form request path split into its token and the endpoint it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPath {
    pub token: String,

    /// Regular endpoint path, e.g. `/api/tools/base64`.
    pub endpoint_path: String,
}

/// Allow-list of admin tokens.
pub struct AdminTokens {
    tokens: HashSet<String>,
}

/// Custom Debug implementation to keep tokens out of logs.
impl std::fmt::Debug for AdminTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminTokens")
            .field("tokens", &format!("[{} REDACTED]", self.tokens.len()))
            .finish()
    }
}

impl AdminTokens {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens
                .into_iter()
                .map(Into::into)
                .filter(|t: &String| !t.trim().is_empty())
                .collect(),
        }
    }

    pub fn from_config(config: &AdminConfig) -> Self {
        Self::new(config.tokens.iter().cloned())
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Validates a token by exact match against the allow-list.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The token is on the allow-list
    /// * `Err(AdminTokenError)` - The token is blank or unknown
    pub fn validate(&self, token: &str) -> Result<(), AdminTokenError> {
        if token.is_empty() {
            return Err(AdminTokenError::Missing);
        }
        if self.tokens.contains(token) {
            Ok(())
        } else {
            Err(AdminTokenError::Unknown)
        }
    }
}

/// Splits `/api/wanga~<token>/<rest>` into the token and `/api/<rest>`.
///
/// Returns `None` for paths that are not in the admin form. The `~` may be
/// percent-encoded.
///
/// # Examples
///
/// ```rust,ignore
/// let admin = parse_admin_path("/api/wanga~secret/tools/base64").unwrap();
/// assert_eq!(admin.endpoint_path, "/api/tools/base64");
/// ```
pub fn parse_admin_path(path: &str) -> Option<AdminPath> {
    let after_api = path.strip_prefix(API_PREFIX)?.strip_prefix('/')?;
    let segment_rest = std::iter::once(ADMIN_SEGMENT_PREFIX)
        .chain(ENCODED_ADMIN_SEGMENT_PREFIXES)
        .find_map(|prefix| after_api.strip_prefix(prefix))?;

    let (token, rest) = segment_rest.split_once('/').unwrap_or((segment_rest, ""));
    Some(AdminPath {
        token: token.to_string(),
        endpoint_path: format!("{}/{}", API_PREFIX, rest),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_admin_path() {
        let admin = parse_admin_path("/api/wanga~s3cret/tools/base64").unwrap();
        assert_eq!(admin.token, "s3cret");
        assert_eq!(admin.endpoint_path, "/api/tools/base64");

        let encoded = parse_admin_path("/api/wanga%7Es3cret/ai/chatbot").unwrap();
        assert_eq!(encoded.token, "s3cret");
        assert_eq!(encoded.endpoint_path, "/api/ai/chatbot");
    }

    #[test]
    fn test_parse_non_admin_paths() {
        assert!(parse_admin_path("/api/tools/base64").is_none());
        assert!(parse_admin_path("/health").is_none());
        assert!(parse_admin_path("/apiwanga~x/tools").is_none());
    }

    #[test]
    fn test_parse_admin_path_without_endpoint() {
        let admin = parse_admin_path("/api/wanga~tok").unwrap();
        assert_eq!(admin.token, "tok");
        assert_eq!(admin.endpoint_path, "/api/");
    }

    #[test]
    fn test_validate_allow_list() {
        let tokens = AdminTokens::new(["alpha", "beta", "  "]);
        assert!(tokens.validate("alpha").is_ok());
        assert_eq!(tokens.validate("gamma"), Err(AdminTokenError::Unknown));
        assert_eq!(tokens.validate(""), Err(AdminTokenError::Missing));
        assert_eq!(tokens.validate("  "), Err(AdminTokenError::Unknown));
    }

    #[test]
    fn test_empty_allow_list_rejects_everything() {
        let tokens = AdminTokens::new(Vec::<String>::new());
        assert!(tokens.is_empty());
        assert_eq!(tokens.validate("wanga123"), Err(AdminTokenError::Unknown));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let debug = format!("{:?}", AdminTokens::new(["super_secret_token"]));
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("super_secret_token"));
    }
}
