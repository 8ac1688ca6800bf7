//! Endpoint Registry - central registration of all API routes.
//!
//! This module provides:
//! - Route paths derived from category/name or a manifest's location
//! - A builder that registers built-ins, then discovers manifest endpoints
//! - An immutable, sorted path -> endpoint map used by the dispatcher

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::error::EndpointError;
use super::handlers::{Endpoint, EndpointHandler, TypedEndpoint};
use super::proxy::{ProxyEndpoint, ProxySpec};
use crate::core::security::ADMIN_SEGMENT_PREFIX;
use crate::domains::upstream::UpstreamClient;

/// Prefix of every endpoint route.
pub const API_PREFIX: &str = "/api";

/// File extension of proxy manifests.
pub const MANIFEST_EXTENSION: &str = "toml";

// ============================================================================
// Route paths
// ============================================================================

/// Segments of a route below `/api`, e.g. `["tools", "base64"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoutePath {
    segments: Vec<String>,
}

impl RoutePath {
    /// Build and validate a route from its segments.
    pub fn new<I, S>(segments: I) -> Result<Self, EndpointError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        let display = segments.join("/");
        if segments.is_empty() {
            return Err(EndpointError::invalid_route(display, "no path segments"));
        }
        if let Some(bad) = segments.iter().find(|s| !is_valid_segment(s)) {
            return Err(EndpointError::invalid_route(
                display.clone(),
                format!("segment {:?} must be non-empty and use only [A-Za-z0-9_.-]", bad),
            ));
        }
        if segments[0].starts_with(ADMIN_SEGMENT_PREFIX) {
            return Err(EndpointError::invalid_route(display, "reserved for admin access"));
        }
        Ok(Self { segments })
    }

    /// Route of a built-in endpoint.
    pub fn builtin(category: &'static str, name: &'static str) -> Self {
        debug_assert!(is_valid_segment(category) && is_valid_segment(name));
        Self {
            segments: vec![category.to_string(), name.to_string()],
        }
    }

    /// Route of a manifest: directory segments plus the file stem.
    pub fn from_relative_path(relative: &Path) -> Result<Self, EndpointError> {
        let mut segments = Vec::new();
        for component in relative.with_extension("").components() {
            match component {
                Component::Normal(part) => match part.to_str() {
                    Some(part) => segments.push(part.to_string()),
                    None => {
                        return Err(EndpointError::invalid_route(
                            relative.display().to_string(),
                            "path is not valid UTF-8",
                        ));
                    }
                },
                _ => {
                    return Err(EndpointError::invalid_route(
                        relative.display().to_string(),
                        "path must be relative to the endpoints directory",
                    ));
                }
            }
        }
        Self::new(segments)
    }

    /// First segment, used to group the listing.
    pub fn category(&self) -> &str {
        &self.segments[0]
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Full URL path, e.g. `/api/tools/base64`.
    pub fn to_path(&self) -> String {
        format!("{}/{}", API_PREFIX, self.segments.join("/"))
    }
}

impl fmt::Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_path())
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

// ============================================================================
// Registered endpoints
// ============================================================================

/// Where an endpoint was registered from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EndpointSource {
    /// Compiled into the server.
    Builtin,

    /// Loaded from a manifest file.
    Manifest { path: PathBuf },
}

/// One routable endpoint.
#[derive(Clone)]
pub struct RegisteredEndpoint {
    route: RoutePath,
    path: String,
    handler: Arc<dyn EndpointHandler>,
    source: EndpointSource,
}

impl RegisteredEndpoint {
    pub fn route(&self) -> &RoutePath {
        &self.route
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn handler(&self) -> &Arc<dyn EndpointHandler> {
        &self.handler
    }

    pub fn source(&self) -> &EndpointSource {
        &self.source
    }
}

impl fmt::Debug for RegisteredEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredEndpoint")
            .field("path", &self.path)
            .field("source", &self.source)
            .finish()
    }
}

// ============================================================================
// Endpoint Registry
// ============================================================================

/// Immutable map of route path to endpoint.
#[derive(Debug, Default)]
pub struct EndpointRegistry {
    endpoints: BTreeMap<String, RegisteredEndpoint>,
}

impl EndpointRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Look up an endpoint by its full path (`/api/...`).
    pub fn get(&self, path: &str) -> Option<&RegisteredEndpoint> {
        self.endpoints.get(path)
    }

    /// Like [`get`](Self::get), but a missing path is an error.
    pub fn resolve(&self, path: &str) -> Result<&RegisteredEndpoint, EndpointError> {
        self.get(path).ok_or_else(|| EndpointError::not_found(path))
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// All endpoints in path order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredEndpoint> {
        self.endpoints.values()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.endpoints.keys().map(String::as_str)
    }

    /// Endpoints grouped by category, each group in path order.
    pub fn by_category(&self) -> BTreeMap<&str, Vec<&RegisteredEndpoint>> {
        let mut groups: BTreeMap<&str, Vec<&RegisteredEndpoint>> = BTreeMap::new();
        for endpoint in self.endpoints.values() {
            groups.entry(endpoint.route.category()).or_default().push(endpoint);
        }
        groups
    }
}

/// Builder collecting registrations; a later registration for the same path
/// replaces the earlier one.
#[derive(Default)]
pub struct RegistryBuilder {
    endpoints: BTreeMap<String, RegisteredEndpoint>,
    skipped: Vec<PathBuf>,
}

impl RegistryBuilder {
    /// Register a typed built-in endpoint.
    pub fn endpoint<E: Endpoint>(self, endpoint: E) -> Self {
        let route = RoutePath::builtin(E::CATEGORY, E::NAME);
        self.handler(route, Arc::new(TypedEndpoint::new(endpoint)))
    }

    /// Register any handler under a route.
    pub fn handler(mut self, route: RoutePath, handler: Arc<dyn EndpointHandler>) -> Self {
        self.insert(route, handler, EndpointSource::Builtin);
        self
    }

    /// Register a built-in proxy endpoint.
    pub fn proxy(self, route: RoutePath, spec: ProxySpec, upstream: &Arc<UpstreamClient>) -> Self {
        self.handler(route, Arc::new(ProxyEndpoint::new(spec, upstream.clone())))
    }

    /// Walk `root` recursively and register every `*.toml` manifest.
    ///
    /// Unreadable files, invalid manifests and illegal path segments are
    /// logged and skipped. Files are visited in sorted order so collisions
    /// resolve deterministically.
    pub fn discover(mut self, root: &Path, upstream: &Arc<UpstreamClient>) -> Self {
        if !root.is_dir() {
            warn!("Endpoints directory {:?} does not exist, skipping discovery", root);
            return self;
        }

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Failed to read endpoints directory entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(MANIFEST_EXTENSION)
            {
                continue;
            }

            match load_manifest_endpoint(root, path, upstream) {
                Ok((route, handler)) => {
                    self.insert(
                        route,
                        handler,
                        EndpointSource::Manifest {
                            path: path.to_path_buf(),
                        },
                    );
                }
                Err(e) => {
                    warn!("Skipping endpoint manifest: {}", e);
                    self.skipped.push(path.to_path_buf());
                }
            }
        }
        self
    }

    /// Manifest files skipped during discovery.
    pub fn skipped(&self) -> &[PathBuf] {
        &self.skipped
    }

    pub fn build(self) -> EndpointRegistry {
        info!(
            "Registered {} endpoints ({} manifests skipped)",
            self.endpoints.len(),
            self.skipped.len()
        );
        EndpointRegistry {
            endpoints: self.endpoints,
        }
    }

    fn insert(&mut self, route: RoutePath, handler: Arc<dyn EndpointHandler>, source: EndpointSource) {
        let path = route.to_path();
        let endpoint = RegisteredEndpoint {
            route,
            path: path.clone(),
            handler,
            source,
        };
        if let Some(previous) = self.endpoints.insert(path.clone(), endpoint) {
            debug!("Endpoint {} replaced (was {:?})", path, previous.source);
        }
    }
}

fn load_manifest_endpoint(
    root: &Path,
    path: &Path,
    upstream: &Arc<UpstreamClient>,
) -> Result<(RoutePath, Arc<dyn EndpointHandler>), EndpointError> {
    let relative = path
        .strip_prefix(root)
        .map_err(|e| EndpointError::manifest(path, e.to_string()))?;
    let route = RoutePath::from_relative_path(relative)?;
    let spec = ProxySpec::load(path)?;
    Ok((route, Arc::new(ProxyEndpoint::new(spec, upstream.clone()))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::UpstreamConfig;
    use crate::domains::endpoints::{HandlerOutcome, QueryParams};
    use async_trait::async_trait;
    use serde_json::{Value, json};

    struct Fixed(&'static str);

    #[async_trait]
    impl EndpointHandler for Fixed {
        fn description(&self) -> &str {
            self.0
        }

        fn parameters(&self) -> Value {
            json!({})
        }

        async fn handle(&self, _query: &QueryParams) -> Result<HandlerOutcome, EndpointError> {
            Ok(HandlerOutcome::success(json!({ "from": self.0 })))
        }
    }

    fn upstream() -> Arc<UpstreamClient> {
        Arc::new(UpstreamClient::new(&UpstreamConfig::default()).unwrap())
    }

    #[test]
    fn test_route_path_validation() {
        assert_eq!(RoutePath::new(["tools", "base64"]).unwrap().to_path(), "/api/tools/base64");
        assert!(RoutePath::new(Vec::<String>::new()).is_err());
        assert!(RoutePath::new(["tools", ""]).is_err());
        assert!(RoutePath::new(["tools", ".."]).is_err());
        assert!(RoutePath::new(["tools", "{name}"]).is_err());
        assert!(RoutePath::new(["wanga~x", "tool"]).is_err());
    }

    #[test]
    fn test_route_from_relative_path() {
        let route = RoutePath::from_relative_path(Path::new("ai/chat-bot.toml")).unwrap();
        assert_eq!(route.to_path(), "/api/ai/chat-bot");
        assert_eq!(route.category(), "ai");
        assert!(RoutePath::from_relative_path(Path::new("../x.toml")).is_err());
    }

    #[test]
    fn test_later_registration_wins() {
        let registry = EndpointRegistry::builder()
            .handler(RoutePath::builtin("tools", "echo"), Arc::new(Fixed("first")))
            .handler(RoutePath::builtin("tools", "echo"), Arc::new(Fixed("second")))
            .build();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("/api/tools/echo").unwrap().handler().description(), "second");
    }

    #[test]
    fn test_by_category_groups_sorted() {
        let registry = EndpointRegistry::builder()
            .handler(RoutePath::builtin("tools", "b"), Arc::new(Fixed("b")))
            .handler(RoutePath::builtin("ai", "chat"), Arc::new(Fixed("chat")))
            .handler(RoutePath::builtin("tools", "a"), Arc::new(Fixed("a")))
            .build();
        let groups = registry.by_category();
        assert_eq!(groups.keys().copied().collect::<Vec<_>>(), vec!["ai", "tools"]);
        let tools: Vec<&str> = groups["tools"].iter().map(|e| e.path()).collect();
        assert_eq!(tools, vec!["/api/tools/a", "/api/tools/b"]);
    }

    #[test]
    fn test_discover_manifest_tree() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("tools")).unwrap();
        std::fs::create_dir_all(dir.path().join("ai")).unwrap();
        std::fs::write(
            dir.path().join("tools/base64.toml"),
            "upstream = \"/base64\"\nparams = [\"text\"]\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("ai/chatbot.toml"),
            "upstream = \"/chatgpt\"\nparams = [\"prompt\"]\nrequired = [\"prompt\"]\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("ai/broken.toml"), "upstream = [not toml").unwrap();
        std::fs::write(dir.path().join("ai/notes.txt"), "ignored").unwrap();

        let builder = EndpointRegistry::builder().discover(dir.path(), &upstream());
        assert_eq!(builder.skipped().len(), 1);
        let registry = builder.build();

        assert_eq!(registry.len(), 2);
        assert!(registry.get("/api/tools/base64").is_some());
        let chatbot = registry.get("/api/ai/chatbot").unwrap();
        assert!(matches!(chatbot.source(), EndpointSource::Manifest { .. }));
        assert!(registry.get("/api/ai/broken").is_none());
    }

    #[test]
    fn test_manifest_overrides_builtin() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("tools")).unwrap();
        std::fs::write(
            dir.path().join("tools/echo.toml"),
            "upstream = \"/echo\"\ndescription = \"manifest\"\n",
        )
        .unwrap();

        let registry = EndpointRegistry::builder()
            .handler(RoutePath::builtin("tools", "echo"), Arc::new(Fixed("builtin")))
            .discover(dir.path(), &upstream())
            .build();
        assert_eq!(registry.get("/api/tools/echo").unwrap().handler().description(), "manifest");
    }

    #[test]
    fn test_discover_missing_dir() {
        let registry = EndpointRegistry::builder()
            .discover(Path::new("/definitely/not/here"), &upstream())
            .build();
        assert!(registry.is_empty());
    }
}
