//! Password strength estimation endpoint.
//!
//! The password itself is never echoed back; only a mask of the same length.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domains::endpoints::{Endpoint, EndpointError, HandlerOutcome, required};

const SEQUENCES: &[&str] = &["0123456789", "abcdefghijklmnopqrstuvwxyz"];

/// Offline attacker guess rate used for the crack-time estimate.
const GUESSES_PER_SECOND: f64 = 1e9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StrengthChecks {
    pub length: bool,
    pub has_lower: bool,
    pub has_upper: bool,
    pub has_number: bool,
    pub has_special: bool,
    pub no_sequential: bool,
    pub no_repeating: bool,
}

impl StrengthChecks {
    pub fn evaluate(password: &str) -> Self {
        Self {
            length: password.chars().count() >= 8,
            has_lower: password.chars().any(|c| c.is_ascii_lowercase()),
            has_upper: password.chars().any(|c| c.is_ascii_uppercase()),
            has_number: password.chars().any(|c| c.is_ascii_digit()),
            has_special: password.chars().any(|c| !c.is_ascii_alphanumeric()),
            no_sequential: !has_sequence(password),
            no_repeating: !has_triple(password),
        }
    }

    pub fn score(&self) -> u32 {
        [
            self.length,
            self.has_lower,
            self.has_upper,
            self.has_number,
            self.has_special,
            self.no_sequential,
            self.no_repeating,
        ]
        .iter()
        .filter(|passed| **passed)
        .count() as u32
    }

    fn suggestions(&self) -> Vec<&'static str> {
        [
            (self.length, "Use at least 8 characters"),
            (self.has_lower, "Add lowercase letters"),
            (self.has_upper, "Add uppercase letters"),
            (self.has_number, "Add numbers"),
            (self.has_special, "Add special characters"),
            (self.no_sequential, "Avoid sequential patterns"),
            (self.no_repeating, "Avoid repeating characters"),
        ]
        .into_iter()
        .filter(|(passed, _)| !passed)
        .map(|(_, hint)| hint)
        .collect()
    }
}

/// Three ascending characters such as `123` or `abc` (case-insensitive).
fn has_sequence(password: &str) -> bool {
    let lower = password.to_ascii_lowercase();
    let chars: Vec<char> = lower.chars().collect();
    chars.windows(3).any(|w| {
        let run: String = w.iter().collect();
        SEQUENCES.iter().any(|seq| seq.contains(&run))
    })
}

/// The same character three times in a row.
fn has_triple(password: &str) -> bool {
    let chars: Vec<char> = password.chars().collect();
    chars.windows(3).any(|w| w[0] == w[1] && w[1] == w[2])
}

fn charset_size(checks: &StrengthChecks) -> u32 {
    let mut size = 0;
    if checks.has_lower {
        size += 26;
    }
    if checks.has_upper {
        size += 26;
    }
    if checks.has_number {
        size += 10;
    }
    if checks.has_special {
        size += 32;
    }
    size
}

pub fn entropy_bits(password: &str, checks: &StrengthChecks) -> f64 {
    let size = charset_size(checks);
    if size == 0 {
        return 0.0;
    }
    password.chars().count() as f64 * f64::from(size).log2()
}

fn crack_time(entropy: f64) -> String {
    let seconds = 2f64.powf(entropy) / GUESSES_PER_SECOND;
    if seconds < 60.0 {
        "seconds".to_string()
    } else if seconds < 3_600.0 {
        format!("{} minutes", (seconds / 60.0).round())
    } else if seconds < 86_400.0 {
        format!("{} hours", (seconds / 3_600.0).round())
    } else if seconds < 31_536_000.0 {
        format!("{} days", (seconds / 86_400.0).round())
    } else if seconds < 31_536_000.0 * 1e6 {
        format!("{} years", (seconds / 31_536_000.0).round())
    } else {
        "millions of years".to_string()
    }
}

fn level(score: u32, length: usize) -> &'static str {
    match score {
        s if s >= 6 && length >= 12 => "Very Strong",
        s if s >= 5 => "Strong",
        4 => "Good",
        3 => "Fair",
        _ => "Weak",
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PasswordParams {
    /// Password to evaluate.
    pub password: Option<String>,
}

pub struct PasswordStrengthValidator;

#[async_trait]
impl Endpoint for PasswordStrengthValidator {
    const CATEGORY: &'static str = "validators";
    const NAME: &'static str = "password-strength";
    const DESCRIPTION: &'static str = "Score a password and estimate how long it would take to crack";
    type Params = PasswordParams;

    async fn execute(&self, params: PasswordParams) -> Result<HandlerOutcome, EndpointError> {
        let password = required(params.password.as_deref(), "Password parameter required")?;
        let length = password.chars().count();
        let checks = StrengthChecks::evaluate(password);
        let score = checks.score();
        let entropy = entropy_bits(password, &checks);

        Ok(HandlerOutcome::success(json!({
            "password": "*".repeat(length),
            "strength": level(score, length),
            "score": score,
            "score_max": 7,
            "entropy_bits": (entropy * 100.0).round() / 100.0,
            "checks": checks,
            "crack_time": crack_time(entropy),
            "suggestions": checks.suggestions(),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns() {
        assert!(has_sequence("xx123"));
        assert!(has_sequence("passABC"));
        assert!(!has_sequence("a1b2c3"));
        assert!(has_triple("baaad"));
        assert!(!has_triple("baad"));
    }

    #[test]
    fn test_levels() {
        let weak = StrengthChecks::evaluate("abc");
        assert_eq!(level(weak.score(), 3), "Weak");

        let strong = StrengthChecks::evaluate("Tr0ub4dor&3x!");
        assert_eq!(strong.score(), 7);
        assert_eq!(level(strong.score(), 13), "Very Strong");
    }

    #[test]
    fn test_entropy() {
        let checks = StrengthChecks::evaluate("aaaa");
        assert!((entropy_bits("aaaa", &checks) - 4.0 * 26f64.log2()).abs() < 1e-9);
        assert_eq!(crack_time(10.0), "seconds");
    }

    #[tokio::test]
    async fn test_password_is_masked() {
        let params = PasswordParams {
            password: Some("hunter2".to_string()),
        };
        let outcome = PasswordStrengthValidator.execute(params).await.unwrap();
        let payload = outcome.payload();
        assert_eq!(payload["password"], "*******");
        assert!(!payload.to_owned().into_iter().any(|(_, v)| v == "hunter2"));
        assert!(payload["suggestions"].as_array().unwrap().len() >= 1);
    }
}
