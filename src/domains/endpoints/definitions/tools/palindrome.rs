//! Palindrome check/generate endpoint.

use async_trait::async_trait;
use rand::Rng;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

use crate::domains::endpoints::{Endpoint, EndpointError, Failure, HandlerOutcome, required};

const MAX_GENERATED_LENGTH: usize = 1000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PalindromeMode {
    Check,
    #[default]
    Generate,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PalindromeParams {
    /// Text to check (required for `type=check`).
    pub text: Option<String>,

    /// `generate` (default) or `check`.
    #[serde(default, rename = "type")]
    pub mode: PalindromeMode,

    /// Length of the generated palindrome.
    #[serde(default = "default_length")]
    pub length: usize,
}

fn default_length() -> usize {
    5
}

pub struct PalindromeTool;

/// Lowercased ASCII letters and digits only.
fn clean(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

pub fn is_palindrome(text: &str) -> bool {
    let cleaned = clean(text);
    cleaned.chars().eq(cleaned.chars().rev())
}

fn generate(length: usize) -> String {
    let mut rng = rand::thread_rng();
    let half: String = (0..length / 2).map(|_| rng.gen_range('a'..='z')).collect();
    let mirrored: String = half.chars().rev().collect();
    if length % 2 == 0 {
        format!("{}{}", half, mirrored)
    } else {
        format!("{}{}{}", half, rng.gen_range('a'..='z'), mirrored)
    }
}

fn join_chars(s: &str, separator: &str) -> String {
    s.chars().map(String::from).collect::<Vec<_>>().join(separator)
}

#[async_trait]
impl Endpoint for PalindromeTool {
    const CATEGORY: &'static str = "tools";
    const NAME: &'static str = "palindrome";
    const DESCRIPTION: &'static str = "Check whether text is a palindrome or generate a random one";
    type Params = PalindromeParams;

    async fn execute(&self, params: PalindromeParams) -> Result<HandlerOutcome, EndpointError> {
        match params.mode {
            PalindromeMode::Check => {
                let text = required(params.text.as_deref(), "Text parameter required for checking")?;
                let cleaned = clean(text);
                let reversed: String = cleaned.chars().rev().collect();
                Ok(HandlerOutcome::success(json!({
                    "text": text,
                    "is_palindrome": cleaned == reversed,
                    "clean_text": cleaned,
                    "reversed": reversed,
                    "details": {
                        "length": cleaned.len(),
                        "has_spaces": text.contains(' '),
                        "has_punctuation": text.chars().any(|c| !c.is_ascii_alphanumeric()),
                        "case_insensitive": true,
                    },
                    "examples": {
                        "famous": ["racecar", "madam", "level", "rotor", "civic"],
                        "sentences": ["A man a plan a canal Panama", "Never odd or even"],
                    },
                })))
            }
            PalindromeMode::Generate => {
                if params.length == 0 || params.length > MAX_GENERATED_LENGTH {
                    return Ok(Failure::invalid_input(format!(
                        "Length must be between 1 and {}",
                        MAX_GENERATED_LENGTH
                    ))
                    .into());
                }
                let palindrome = generate(params.length);
                Ok(HandlerOutcome::success(json!({
                    "generated": palindrome,
                    "length": palindrome.len(),
                    "type": if params.length % 2 == 0 { "even" } else { "odd" },
                    "variations": [
                        palindrome.to_uppercase(),
                        join_chars(&palindrome, " "),
                        join_chars(&palindrome, "-"),
                    ],
                })))
            }
        }
    }
}
