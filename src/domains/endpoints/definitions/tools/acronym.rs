//! Acronym builder endpoint.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

use crate::domains::endpoints::{Endpoint, EndpointError, HandlerOutcome, required};

const KNOWN_ACRONYMS: &[(&str, &str)] = &[
    ("API", "Application Programming Interface"),
    ("CLI", "Command Line Interface"),
    ("CPU", "Central Processing Unit"),
    ("CSS", "Cascading Style Sheets"),
    ("GUI", "Graphical User Interface"),
    ("HTML", "HyperText Markup Language"),
    ("HTTP", "HyperText Transfer Protocol"),
    ("IDE", "Integrated Development Environment"),
    ("JPG", "Joint Photographic Experts Group"),
    ("JS", "JavaScript"),
    ("JSON", "JavaScript Object Notation"),
    ("PDF", "Portable Document Format"),
    ("PNG", "Portable Network Graphics"),
    ("RAM", "Random Access Memory"),
    ("ROM", "Read Only Memory"),
    ("SDK", "Software Development Kit"),
    ("SQL", "Structured Query Language"),
    ("URI", "Uniform Resource Identifier"),
    ("URL", "Uniform Resource Locator"),
    ("XML", "eXtensible Markup Language"),
];

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AcronymParams {
    /// Phrase to abbreviate.
    pub phrase: Option<String>,
}

pub struct AcronymTool;

fn initial(word: &str) -> String {
    word.chars().next().map(|c| c.to_uppercase().collect()).unwrap_or_default()
}

fn join_chars(s: &str, separator: &str) -> String {
    s.chars().map(String::from).collect::<Vec<_>>().join(separator)
}

#[async_trait]
impl Endpoint for AcronymTool {
    const CATEGORY: &'static str = "tools";
    const NAME: &'static str = "acronym";
    const DESCRIPTION: &'static str = "Build an acronym from a phrase";
    type Params = AcronymParams;

    async fn execute(&self, params: AcronymParams) -> Result<HandlerOutcome, EndpointError> {
        let phrase = required(params.phrase.as_deref(), "Phrase parameter required")?;
        let words: Vec<&str> = phrase.split_whitespace().collect();
        let acronym: String = words.iter().map(|w| initial(w)).collect();

        let breakdown: Vec<_> = words
            .iter()
            .enumerate()
            .map(|(i, word)| json!({ "word": word, "letter": initial(word), "position": i + 1 }))
            .collect();
        let matches: Vec<_> = KNOWN_ACRONYMS
            .iter()
            .filter(|(key, _)| *key == acronym)
            .map(|(key, meaning)| json!({ "acronym": key, "meaning": meaning }))
            .collect();

        Ok(HandlerOutcome::success(json!({
            "phrase": phrase,
            "acronym": acronym,
            "words": words,
            "word_count": words.len(),
            "breakdown": breakdown,
            "variations": {
                "lowercase": acronym.to_lowercase(),
                "with_dots": join_chars(&acronym, "."),
                "spaced": join_chars(&acronym, " "),
            },
            "common_matches": matches,
        })))
    }
}
