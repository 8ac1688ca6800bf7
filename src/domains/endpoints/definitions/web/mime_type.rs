//! MIME type lookup endpoint.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;

use crate::domains::endpoints::{Endpoint, EndpointError, HandlerOutcome};

const FALLBACK_TYPE: &str = "application/octet-stream";
const MAX_SEARCH_RESULTS: usize = 20;

const COMMON_TYPES: &[&str] = &[
    "text/html",
    "text/css",
    "text/javascript",
    "application/json",
    "application/xml",
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/svg+xml",
    "application/pdf",
    "application/zip",
    "audio/mpeg",
    "video/mp4",
];

/// Extensions scanned by `search`.
const SEARCHABLE_EXTENSIONS: &[&str] = &[
    "html", "htm", "css", "js", "mjs", "json", "xml", "txt", "csv", "md", "yaml", "toml", "jpg", "jpeg",
    "png", "gif", "svg", "webp", "ico", "bmp", "tif", "avif", "mp3", "wav", "ogg", "flac", "aac", "m4a",
    "mp4", "webm", "mkv", "avi", "mov", "pdf", "zip", "gz", "tar", "7z", "rar", "doc", "docx", "xls",
    "xlsx", "ppt", "pptx", "odt", "epub", "woff", "woff2", "ttf", "otf", "wasm", "exe", "apk", "jar",
    "rtf", "ics", "sql",
];

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct MimeTypeParams {
    /// File extension to look up, with or without the dot.
    pub extension: Option<String>,

    /// MIME type to look up, e.g. `application/json`.
    pub mime: Option<String>,

    /// Substring matched against types and extensions.
    pub search: Option<String>,
}

pub struct MimeTypeTool;

pub fn category(mime: &str) -> &'static str {
    match mime.split('/').next().unwrap_or_default() {
        "text" => "text",
        "image" => "image",
        "audio" => "audio",
        "video" => "video",
        "application" => "application",
        "font" => "font",
        "" => "unknown",
        _ => "other",
    }
}

fn charset(mime: &str) -> Option<&'static str> {
    let textual = mime.starts_with("text/")
        || matches!(mime, "application/json" | "application/javascript" | "application/xml");
    textual.then_some("UTF-8")
}

fn extensions_of(mime: &str) -> &'static [&'static str] {
    mime_guess::get_mime_extensions_str(mime).unwrap_or(&[])
}

fn description(mime: &str) -> &'static str {
    match mime {
        "text/html" => "HyperText Markup Language",
        "application/json" => "JavaScript Object Notation",
        "image/jpeg" => "Joint Photographic Experts Group image",
        "application/pdf" => "Portable Document Format",
        _ => "Media type",
    }
}

fn related(mime: &str) -> &'static [&'static str] {
    match mime {
        "text/html" => &["text/plain", "text/xml"],
        "application/json" => &["application/xml", "text/plain"],
        "image/jpeg" => &["image/png", "image/gif"],
        _ => &[],
    }
}

fn by_extension(raw: &str) -> Value {
    let bare = raw.trim().trim_start_matches('.').to_ascii_lowercase();
    let guess = mime_guess::from_ext(&bare).first();
    let mime = guess
        .as_ref()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| FALLBACK_TYPE.to_string());

    json!({
        "extension": format!(".{}", bare),
        "mime_type": mime,
        "known": guess.is_some(),
        "charset": charset(&mime),
        "common": guess.is_some() && COMMON_TYPES.contains(&mime.as_str()),
        "category": if guess.is_some() { category(&mime) } else { "unknown" },
        "aliases": extensions_of(&mime),
    })
}

fn by_mime(raw: &str) -> Value {
    let mime = raw.trim().to_ascii_lowercase();
    let extensions = extensions_of(&mime);
    json!({
        "mime_type": mime,
        "extension": extensions.first().copied().unwrap_or("Unknown"),
        "charset": charset(&mime),
        "category": category(&mime),
        "description": description(&mime),
        "common_extensions": extensions,
        "related_types": related(&mime),
    })
}

fn search(term: &str) -> Value {
    let needle = term.trim().to_ascii_lowercase();
    let mut matches: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for &ext in SEARCHABLE_EXTENSIONS {
        let Some(mime) = mime_guess::from_ext(ext).first() else {
            continue;
        };
        let mime = mime.essence_str().to_string();
        if mime.contains(&needle) || ext.contains(&needle) {
            matches.entry(mime).or_default().push(ext);
        }
    }
    let results: Vec<Value> = matches
        .into_iter()
        .take(MAX_SEARCH_RESULTS)
        .map(|(mime, extensions)| {
            json!({
                "mime_type": mime,
                "extensions": extensions,
                "charset": charset(&mime),
                "category": category(&mime),
            })
        })
        .collect();
    json!({ "search": term, "results": results })
}

fn overview() -> Value {
    let common: Vec<Value> = COMMON_TYPES
        .iter()
        .map(|mime| {
            json!({
                "mime_type": mime,
                "extension": extensions_of(mime).first(),
                "category": category(mime),
            })
        })
        .collect();
    json!({
        "common_types": common,
        "categories": {
            "text": ["html", "css", "javascript", "plain", "csv", "xml"],
            "image": ["jpeg", "png", "gif", "svg+xml", "webp"],
            "application": ["json", "pdf", "zip", "octet-stream"],
            "audio": ["mpeg", "wav", "ogg"],
            "video": ["mp4", "webm", "ogg"],
            "font": ["woff", "woff2", "ttf", "otf"],
        },
    })
}

#[async_trait]
impl Endpoint for MimeTypeTool {
    const CATEGORY: &'static str = "web";
    const NAME: &'static str = "mime-type";
    const DESCRIPTION: &'static str = "Look up MIME types by extension or type, or search them";
    type Params = MimeTypeParams;

    async fn execute(&self, params: MimeTypeParams) -> Result<HandlerOutcome, EndpointError> {
        let present = |value: &Option<String>| value.as_deref().filter(|v| !v.trim().is_empty()).map(str::to_string);

        let body = if let Some(extension) = present(&params.extension) {
            by_extension(&extension)
        } else if let Some(mime) = present(&params.mime) {
            by_mime(&mime)
        } else if let Some(term) = present(&params.search) {
            search(&term)
        } else {
            overview()
        };
        Ok(HandlerOutcome::success(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(params: MimeTypeParams) -> Value {
        let outcome = tokio_test::block_on(MimeTypeTool.execute(params)).unwrap();
        Value::Object(outcome.payload().clone())
    }

    fn only(extension: Option<&str>, mime: Option<&str>, search: Option<&str>) -> MimeTypeParams {
        MimeTypeParams {
            extension: extension.map(str::to_string),
            mime: mime.map(str::to_string),
            search: search.map(str::to_string),
        }
    }

    #[test]
    fn test_lookup_by_extension() {
        let body = run(only(Some(".json"), None, None));
        assert_eq!(body["extension"], ".json");
        assert_eq!(body["mime_type"], "application/json");
        assert_eq!(body["category"], "application");
        assert_eq!(body["common"], true);
        assert_eq!(body["charset"], "UTF-8");

        let png = run(only(Some("PNG"), None, None));
        assert_eq!(png["mime_type"], "image/png");
        assert!(png["charset"].is_null());
    }

    #[test]
    fn test_unknown_extension_falls_back() {
        let body = run(only(Some("nosuchext"), None, None));
        assert_eq!(body["mime_type"], FALLBACK_TYPE);
        assert_eq!(body["known"], false);
        assert_eq!(body["category"], "unknown");
    }

    #[test]
    fn test_lookup_by_mime() {
        let body = run(only(None, Some("text/html"), None));
        assert!(body["common_extensions"].as_array().unwrap().iter().any(|e| e == "html"));
        assert_eq!(body["description"], "HyperText Markup Language");
        assert_eq!(body["related_types"][0], "text/plain");

        let unknown = run(only(None, Some("application/x-made-up"), None));
        assert_eq!(unknown["extension"], "Unknown");
    }

    #[test]
    fn test_search_and_overview() {
        let body = run(only(None, None, Some("image")));
        let results = body["results"].as_array().unwrap();
        assert!(!results.is_empty());
        assert!(results.iter().all(|r| r["category"] == "image"));

        let overview = run(only(None, None, None));
        assert_eq!(overview["common_types"].as_array().unwrap().len(), COMMON_TYPES.len());
    }

    #[test]
    fn test_category() {
        assert_eq!(category("font/woff2"), "font");
        assert_eq!(category("model/gltf+json"), "other");
        assert_eq!(category(""), "unknown");
    }
}
