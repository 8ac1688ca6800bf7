//! Text statistics and sentiment endpoint.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use vader_sentiment::SentimentIntensityAnalyzer;

use crate::domains::endpoints::{Endpoint, EndpointError, HandlerOutcome, required};

const WORDS_PER_MINUTE: f64 = 200.0;
const PREVIEW_CHARS: usize = 100;
const MAX_KEYWORDS: usize = 10;
/// Compound scores beyond this are labelled positive or negative.
const SENTIMENT_THRESHOLD: f64 = 0.2;

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "this", "that",
    "from", "have", "were", "they",
];

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AnalyzeParams {
    /// Text to analyze.
    pub text: Option<String>,
}

pub struct AnalyzeTool;

pub fn words(text: &str) -> Vec<&str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|w| w.trim_matches('\''))
        .filter(|w| !w.is_empty())
        .collect()
}

pub fn sentences(text: &str) -> usize {
    text.split(['.', '!', '?']).filter(|s| !s.trim().is_empty()).count()
}

fn keywords<'a>(words: &[&'a str]) -> Vec<&'a str> {
    words
        .iter()
        .copied()
        .filter(|w| w.chars().count() > 3 && !STOPWORDS.contains(&w.to_lowercase().as_str()))
        .take(MAX_KEYWORDS)
        .collect()
}

/// VADER compound score in `-1.0..=1.0`.
pub fn sentiment(text: &str) -> f64 {
    let analyzer = SentimentIntensityAnalyzer::new();
    analyzer.polarity_scores(text).get("compound").copied().unwrap_or(0.0)
}

fn label(score: f64) -> &'static str {
    if score > SENTIMENT_THRESHOLD {
        "positive"
    } else if score < -SENTIMENT_THRESHOLD {
        "negative"
    } else {
        "neutral"
    }
}

#[async_trait]
impl Endpoint for AnalyzeTool {
    const CATEGORY: &'static str = "tools";
    const NAME: &'static str = "analyze";
    const DESCRIPTION: &'static str = "Word and sentence statistics, reading time, sentiment and keywords";
    type Params = AnalyzeParams;

    async fn execute(&self, params: AnalyzeParams) -> Result<HandlerOutcome, EndpointError> {
        let text = required(params.text.as_deref(), "Text parameter is required")?;

        let words = words(text);
        let characters = text.chars().count();
        let non_space = text.chars().filter(|c| !c.is_whitespace()).count();
        let minutes = words.len() as f64 / WORDS_PER_MINUTE;
        let score = sentiment(text);

        let preview = if characters > PREVIEW_CHARS {
            format!("{}...", text.chars().take(PREVIEW_CHARS).collect::<String>())
        } else {
            text.to_string()
        };
        let average_word_length = if words.is_empty() {
            0.0
        } else {
            let letters: usize = words.iter().map(|w| w.chars().count()).sum();
            (letters as f64 / words.len() as f64 * 100.0).round() / 100.0
        };

        Ok(HandlerOutcome::success(json!({
            "text_preview": preview,
            "statistics": {
                "word_count": words.len(),
                "sentence_count": sentences(text),
                "character_count": characters,
                "character_count_no_spaces": non_space,
                "average_word_length": average_word_length,
            },
            "reading_time": {
                "minutes": (minutes * 10.0).round() / 10.0,
                "seconds": (minutes * 60.0).round() as u64,
                "level": match minutes {
                    m if m < 1.0 => "quick",
                    m if m < 5.0 => "medium",
                    _ => "long",
                },
            },
            "sentiment": {
                "score": score,
                "label": label(score),
                "confidence": score.abs(),
            },
            "keywords": keywords(&words),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(text: &str) -> serde_json::Value {
        let params = AnalyzeParams {
            text: Some(text.to_string()),
        };
        let outcome = tokio_test::block_on(AnalyzeTool.execute(params)).unwrap();
        serde_json::Value::Object(outcome.payload().clone())
    }

    #[test]
    fn test_tokenizing() {
        assert_eq!(words("Hello, world! Don't stop."), vec!["Hello", "world", "Don't", "stop"]);
        assert_eq!(sentences("One. Two! Three? "), 3);
        assert_eq!(sentences("no terminator"), 1);
        assert!(words("  ...  ").is_empty());
    }

    #[test]
    fn test_statistics() {
        let body = analyze("Hello world. Bye!");
        assert_eq!(body["statistics"]["word_count"], 3);
        assert_eq!(body["statistics"]["sentence_count"], 2);
        assert_eq!(body["statistics"]["character_count"], 17);
        assert_eq!(body["reading_time"]["level"], "quick");
        assert_eq!(body["text_preview"], "Hello world. Bye!");
    }

    #[test]
    fn test_sentiment_labels() {
        assert_eq!(analyze("I love this wonderful product, it is great!")["sentiment"]["label"], "positive");
        assert_eq!(analyze("This is a terrible, awful and horrible mess.")["sentiment"]["label"], "negative");
        assert_eq!(label(0.0), "neutral");
    }

    #[test]
    fn test_keywords_skip_short_and_stop_words() {
        let body = analyze("The quick brown foxes jumped over that lazy sleeping dog");
        let keywords: Vec<&str> = body["keywords"]
            .as_array()
            .unwrap()
            .iter()
            .map(|k| k.as_str().unwrap())
            .collect();
        assert_eq!(keywords, vec!["quick", "brown", "foxes", "jumped", "over", "lazy", "sleeping"]);
    }

    #[test]
    fn test_missing_text_is_client_error() {
        let params = AnalyzeParams { text: None };
        let err = tokio_test::block_on(AnalyzeTool.execute(params)).unwrap_err();
        assert!(err.is_client_error());
    }
}
