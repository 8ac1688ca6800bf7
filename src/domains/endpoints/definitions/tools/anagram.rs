//! Anagram generation endpoint.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;

use crate::domains::endpoints::{Endpoint, EndpointError, Failure, HandlerOutcome, required};

/// Longest word accepted; factorials above this overflow `u64`.
pub const MAX_WORD_LENGTH: usize = 20;

/// Number of anagrams returned.
pub const MAX_ANAGRAMS: usize = 50;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AnagramParams {
    /// Word to permute (at most 20 characters).
    pub word: Option<String>,
}

pub struct AnagramTool;

/// Rearrange `chars` into the next lexicographic permutation.
/// Returns false once the last permutation has been reached.
fn next_permutation(chars: &mut [char]) -> bool {
    let Some(pivot) = chars.windows(2).rposition(|w| w[0] < w[1]) else {
        return false;
    };
    let Some(successor) = chars.iter().rposition(|c| *c > chars[pivot]) else {
        return false;
    };
    chars.swap(pivot, successor);
    chars[pivot + 1..].reverse();
    true
}

/// The first `limit` distinct permutations in lexicographic order.
pub fn anagrams(word: &str, limit: usize) -> Vec<String> {
    let mut chars: Vec<char> = word.chars().collect();
    chars.sort_unstable();

    let mut result = Vec::new();
    if chars.is_empty() || limit == 0 {
        return result;
    }
    loop {
        result.push(chars.iter().collect());
        if result.len() >= limit || !next_permutation(&mut chars) {
            return result;
        }
    }
}

fn factorial(n: usize) -> u64 {
    (2..=n as u64).product()
}

/// `n! / (c1! * c2! * ...)` for the letter multiplicities of `word`.
pub fn distinct_permutations(word: &str) -> u64 {
    let mut counts: BTreeMap<char, usize> = BTreeMap::new();
    for c in word.chars() {
        *counts.entry(c).or_default() += 1;
    }
    let n = word.chars().count();
    let divisor: u64 = counts.values().map(|&c| factorial(c)).product();
    factorial(n) / divisor
}

#[async_trait]
impl Endpoint for AnagramTool {
    const CATEGORY: &'static str = "tools";
    const NAME: &'static str = "anagram";
    const DESCRIPTION: &'static str = "List anagrams (letter permutations) of a word";
    type Params = AnagramParams;

    async fn execute(&self, params: AnagramParams) -> Result<HandlerOutcome, EndpointError> {
        let word = required(params.word.as_deref(), "Word parameter required")?.trim();
        let length = word.chars().count();
        if length > MAX_WORD_LENGTH {
            return Ok(Failure::invalid_input(format!(
                "Word too long: {} characters (maximum {})",
                length, MAX_WORD_LENGTH
            ))
            .into());
        }

        let lower = word.to_lowercase();
        let mut sorted: Vec<char> = lower.chars().collect();
        sorted.sort_unstable();
        let unique_letters = {
            let mut letters = sorted.clone();
            letters.dedup();
            letters.len()
        };

        Ok(HandlerOutcome::success(json!({
            "word": word,
            "length": length,
            "sorted_letters": sorted.iter().collect::<String>(),
            "anagram_count": distinct_permutations(&lower),
            "anagrams": anagrams(&lower, MAX_ANAGRAMS),
            "is_palindrome": lower.chars().eq(lower.chars().rev()),
            "permutations": factorial(length),
            "unique_letters": unique_letters,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anagrams_are_sorted_and_distinct() {
        assert_eq!(anagrams("cab", 50), vec!["abc", "acb", "bac", "bca", "cab", "cba"]);
        assert_eq!(anagrams("aab", 50), vec!["aab", "aba", "baa"]);
        assert_eq!(anagrams("abcd", 2), vec!["abcd", "abdc"]);
        assert!(anagrams("", 50).is_empty());
    }

    #[test]
    fn test_distinct_permutations() {
        assert_eq!(distinct_permutations("abc"), 6);
        assert_eq!(distinct_permutations("aab"), 3);
        assert_eq!(distinct_permutations("aaaa"), 1);
        assert_eq!(factorial(20), 2_432_902_008_176_640_000);
    }

    #[tokio::test]
    async fn test_execute_limits_output() {
        let params = AnagramParams {
            word: Some("abcdef".to_string()),
        };
        let outcome = AnagramTool.execute(params).await.unwrap();
        let payload = outcome.payload();
        assert_eq!(payload["anagram_count"], 720);
        assert_eq!(payload["anagrams"].as_array().unwrap().len(), MAX_ANAGRAMS);
        assert_eq!(payload["anagrams"][0], "abcdef");
    }

    #[tokio::test]
    async fn test_palindrome_ignores_case() {
        let params = AnagramParams {
            word: Some("Level".to_string()),
        };
        let outcome = AnagramTool.execute(params).await.unwrap();
        assert_eq!(outcome.payload()["is_palindrome"], true);
        assert_eq!(outcome.payload()["word"], "Level");
    }

    #[tokio::test]
    async fn test_execute_rejects_long_words() {
        let params = AnagramParams {
            word: Some("a".repeat(21)),
        };
        let outcome = AnagramTool.execute(params).await.unwrap();
        assert!(!outcome.is_success());
    }
}
