//! Endpoint definitions module.
//!
//! One file per local endpoint, grouped by route category. Plain proxy
//! endpoints have no file of their own; they are rows of [`PROXY_TABLE`].
//!
//! ## Adding an endpoint
//!
//! 1. Create a file in the category directory with a params struct and a
//!    type implementing [`Endpoint`](super::Endpoint)
//! 2. Export it from the category's `mod.rs`
//! 3. Register it in [`builtin_endpoints`]
//!
//! A pure proxy only needs a row in [`PROXY_TABLE`], or a `*.toml` manifest
//! in the endpoints directory.

use std::sync::Arc;

use super::proxy::ProxySpec;
use super::registry::{RegistryBuilder, RoutePath};
use crate::domains::upstream::UpstreamClient;

pub mod generators;
pub mod image;
pub mod time;
pub mod tools;
pub mod validator;
pub mod validators;
pub mod web;

use self::generators::{FakeDataTool, RandomNumberTool};
use self::image::FluxTool;
use self::time::{TimestampTool, TimezoneTool};
use self::tools::{
    AcronymTool, AnagramTool, AnalyzeTool, Base64Tool, BinaryTool, HashTool, MorseTool, PalindromeTool,
    QrCodeTool, UuidTool,
};
use self::validator::{IpValidator, JsonValidator, PhoneValidator, UrlValidator};
use self::validators::{EmailValidator, PasswordStrengthValidator};
use self::web::{HttpStatusTool, MimeTypeTool, UserAgentTool};

// ============================================================================
// Proxy table
// ============================================================================

/// One built-in proxy: category, name, upstream path, description and the
/// forwarded parameters (the first one is required).
struct ProxyRow {
    category: &'static str,
    name: &'static str,
    upstream: &'static str,
    description: &'static str,
    params: &'static [&'static str],
}

const PROXY_TABLE: &[ProxyRow] = &[
    ProxyRow {
        category: "ai",
        name: "chatbot",
        upstream: "/chatgpt",
        description: "Chat with a ChatGPT-style assistant",
        params: &["prompt"],
    },
    ProxyRow {
        category: "ai",
        name: "copilot",
        upstream: "/copilot",
        description: "Ask Microsoft Copilot",
        params: &["prompt"],
    },
    ProxyRow {
        category: "ai",
        name: "gemini",
        upstream: "/gemini",
        description: "Ask Google Gemini",
        params: &["prompt"],
    },
    ProxyRow {
        category: "ai",
        name: "musicgen",
        upstream: "/musicgen",
        description: "Generate music from a text prompt",
        params: &["prompt"],
    },
    ProxyRow {
        category: "ai",
        name: "storyai",
        upstream: "/story",
        description: "Write a short story from a prompt",
        params: &["prompt"],
    },
    ProxyRow {
        category: "ai",
        name: "video",
        upstream: "/aivideo",
        description: "Generate a short video from a prompt",
        params: &["prompt", "type"],
    },
    ProxyRow {
        category: "ai",
        name: "video2",
        upstream: "/aivideo2",
        description: "Generate a short video from a prompt (alternate model)",
        params: &["prompt", "type"],
    },
    ProxyRow {
        category: "image",
        name: "firelogo",
        upstream: "/firelogo",
        description: "Render text as a fire-styled logo",
        params: &["text"],
    },
    ProxyRow {
        category: "image",
        name: "image",
        upstream: "/image",
        description: "Generate an image from a text prompt",
        params: &["prompt"],
    },
    ProxyRow {
        category: "social",
        name: "facebook",
        upstream: "/facebook",
        description: "Download Facebook media",
        params: &["url"],
    },
    ProxyRow {
        category: "social",
        name: "instagram",
        upstream: "/instagram",
        description: "Download Instagram media",
        params: &["url"],
    },
    ProxyRow {
        category: "social",
        name: "tiktok",
        upstream: "/tiktok",
        description: "Download TikTok videos",
        params: &["url"],
    },
    ProxyRow {
        category: "social",
        name: "x",
        upstream: "/x",
        description: "Download media from X (Twitter)",
        params: &["url"],
    },
    ProxyRow {
        category: "spotify",
        name: "spotify",
        upstream: "/spotify",
        description: "Download a Spotify track",
        params: &["url"],
    },
    ProxyRow {
        category: "spotify",
        name: "spssearch",
        upstream: "/sps",
        description: "Search Spotify tracks",
        params: &["q"],
    },
    ProxyRow {
        category: "tools",
        name: "aio",
        upstream: "/aio",
        description: "All-in-one media downloader",
        params: &["url"],
    },
];

fn proxy_specs() -> Vec<(RoutePath, ProxySpec)> {
    let mut specs: Vec<(RoutePath, ProxySpec)> = PROXY_TABLE
        .iter()
        .map(|row| {
            (
                RoutePath::builtin(row.category, row.name),
                ProxySpec::new(row.upstream, row.description, row.params),
            )
        })
        .collect();

    specs.push((
        RoutePath::builtin("youtube", "ytdown"),
        ProxySpec::new("/ytdown", "Download YouTube audio or video", &["url", "format"])
            .with_default("format", "mp3")
            .with_pick(&["title", "downloadURL"]),
    ));
    specs.push((
        RoutePath::builtin("media", "ytsearch"),
        ProxySpec::new("/ytsearch", "Search YouTube videos", &["q"]).with_pick(&["results"]),
    ));
    specs
}

// ============================================================================
// Registration
// ============================================================================

/// Register every built-in endpoint.
pub fn builtin_endpoints(builder: RegistryBuilder, upstream: &Arc<UpstreamClient>) -> RegistryBuilder {
    let mut builder = builder
        .endpoint(AcronymTool)
        .endpoint(AnagramTool)
        .endpoint(Base64Tool)
        .endpoint(BinaryTool)
        .endpoint(AnalyzeTool)
        .endpoint(HashTool)
        .endpoint(MorseTool)
        .endpoint(PalindromeTool)
        .endpoint(QrCodeTool)
        .endpoint(UuidTool)
        .endpoint(FakeDataTool)
        .endpoint(RandomNumberTool)
        .endpoint(EmailValidator)
        .endpoint(PasswordStrengthValidator)
        .endpoint(IpValidator)
        .endpoint(JsonValidator)
        .endpoint(PhoneValidator)
        .endpoint(UrlValidator)
        .endpoint(HttpStatusTool)
        .endpoint(MimeTypeTool)
        .endpoint(UserAgentTool)
        .endpoint(TimestampTool)
        .endpoint(TimezoneTool)
        .endpoint(FluxTool::new(upstream.clone()));

    for (route, spec) in proxy_specs() {
        builder = builder.proxy(route, spec, upstream);
    }
    builder
}
