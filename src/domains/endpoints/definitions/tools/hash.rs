//! Hash generation endpoint.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use md5::Md5;
use ripemd::Ripemd160;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use sha3::{Sha3_256, Sha3_512};
use whirlpool::Whirlpool;

use crate::domains::endpoints::{Endpoint, EndpointError, Failure, HandlerOutcome};

/// Supported digest algorithms with their output size, rating and typical use.
const ALGORITHMS: &[(&str, u32, &str, &str)] = &[
    ("md5", 128, "weak (deprecated)", "checksums only, not security"),
    ("sha1", 160, "weak (deprecated)", "legacy systems only"),
    ("sha256", 256, "strong", "general purpose, blockchain"),
    ("sha512", 512, "very strong", "high security applications"),
    ("sha3_256", 256, "strong", "modern applications"),
    ("sha3_512", 512, "very strong", "high security modern apps"),
    ("ripemd160", 160, "moderate", "Bitcoin addresses"),
    ("whirlpool", 512, "strong", "cryptographic applications"),
];

pub const MAX_ITERATIONS: u32 = 1_000_000;
pub const MAX_KEY_LENGTH: usize = 1024;

fn hex_digest<D: Digest>(input: &[u8]) -> String {
    hex::encode(D::digest(input))
}

fn digest_hex(algorithm: &str, input: &[u8]) -> Option<String> {
    let hash = match algorithm {
        "md5" => hex_digest::<Md5>(input),
        "sha1" => hex_digest::<Sha1>(input),
        "sha256" => hex_digest::<Sha256>(input),
        "sha512" => hex_digest::<Sha512>(input),
        "sha3_256" => hex_digest::<Sha3_256>(input),
        "sha3_512" => hex_digest::<Sha3_512>(input),
        "ripemd160" => hex_digest::<Ripemd160>(input),
        "whirlpool" => hex_digest::<Whirlpool>(input),
        _ => return None,
    };
    Some(hash)
}

/// PBKDF2-HMAC with the named digest, hex encoded.
fn pbkdf2_hex(digest: &str, password: &[u8], salt: &[u8], rounds: u32, key_length: usize) -> Option<String> {
    let mut key = vec![0u8; key_length];
    match digest {
        "sha1" => pbkdf2::pbkdf2_hmac::<Sha1>(password, salt, rounds, &mut key),
        "sha256" => pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, rounds, &mut key),
        "sha512" => pbkdf2::pbkdf2_hmac::<Sha512>(password, salt, rounds, &mut key),
        _ => return None,
    }
    Some(hex::encode(key))
}

fn encodings(text: &str) -> Value {
    json!({
        "base64": STANDARD.encode(text),
        "hex": hex::encode(text),
        "base64url": URL_SAFE_NO_PAD.encode(text),
    })
}

/// `SHA3-256` and `sha3-256` both name `sha3_256`.
fn normalize(algorithm: &str) -> String {
    algorithm.trim().to_ascii_lowercase().replace('-', "_")
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct HashParams {
    /// Text to hash.
    pub text: Option<String>,

    /// `all` (default) or one of md5, sha1, sha256, sha512, sha3_256,
    /// sha3_512, ripemd160, whirlpool.
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// Salt for PBKDF2; no key is derived without one.
    #[serde(default)]
    pub salt: Option<String>,

    /// PBKDF2 rounds.
    #[serde(default = "default_iterations")]
    pub iterations: u32,

    /// Derived key length in bytes.
    #[serde(default = "default_keylen")]
    pub keylen: usize,

    /// PBKDF2 HMAC digest: sha1, sha256 or sha512 (default).
    #[serde(default = "default_digest")]
    pub digest: String,
}

fn default_algorithm() -> String {
    "all".to_string()
}

fn default_iterations() -> u32 {
    10_000
}

fn default_keylen() -> usize {
    64
}

fn default_digest() -> String {
    "sha512".to_string()
}

pub struct HashTool;

impl HashTool {
    fn pbkdf2(&self, text: &str, params: &HashParams) -> Result<Value, Failure> {
        let Some(salt) = params.salt.as_deref().filter(|s| !s.is_empty()) else {
            return Ok(Value::Null);
        };
        if !(1..=MAX_ITERATIONS).contains(&params.iterations) {
            return Err(Failure::invalid_input(format!(
                "iterations must be between 1 and {}",
                MAX_ITERATIONS
            )));
        }
        if !(1..=MAX_KEY_LENGTH).contains(&params.keylen) {
            return Err(Failure::invalid_input(format!(
                "keylen must be between 1 and {}",
                MAX_KEY_LENGTH
            )));
        }
        let digest = params.digest.trim().to_ascii_lowercase();
        let hash = pbkdf2_hex(&digest, text.as_bytes(), salt.as_bytes(), params.iterations, params.keylen)
            .ok_or_else(|| {
                Failure::invalid_input(format!("Unsupported PBKDF2 digest: {}", digest))
                    .with_suggestion("Use sha1, sha256 or sha512")
            })?;

        Ok(json!({
            "hash": hash,
            "salt": salt,
            "iterations": params.iterations,
            "key_length": params.keylen,
            "digest": digest,
            "purpose": "password storage",
        }))
    }
}

#[async_trait]
impl Endpoint for HashTool {
    const CATEGORY: &'static str = "tools";
    const NAME: &'static str = "hash";
    const DESCRIPTION: &'static str = "Hash text with MD5, SHA-1, SHA-2, SHA-3, RIPEMD-160 or Whirlpool, with optional PBKDF2";
    type Params = HashParams;

    async fn execute(&self, params: HashParams) -> Result<HandlerOutcome, EndpointError> {
        let Some(text) = params.text.as_deref().filter(|t| !t.is_empty()) else {
            return Ok(Failure::invalid_input("Text parameter is required")
                .with_detail("example", "/api/tools/hash?text=password123&algorithm=sha256")
                .into());
        };
        let algorithm = match normalize(&params.algorithm) {
            a if a.is_empty() => "all".to_string(),
            a => a,
        };
        let input = text.as_bytes();
        let pbkdf2 = match self.pbkdf2(text, &params) {
            Ok(value) => value,
            Err(failure) => return Ok(failure.into()),
        };

        if algorithm != "all" {
            let Some(&(name, bits, security, use_case)) = ALGORITHMS.iter().find(|(n, ..)| *n == algorithm) else {
                let supported: Vec<&str> = ALGORITHMS.iter().map(|(n, ..)| *n).collect();
                return Ok(Failure::invalid_input(format!("Unsupported algorithm: {}", algorithm))
                    .with_suggestion(format!("Use one of: all, {}", supported.join(", ")))
                    .into());
            };
            let hash = digest_hex(name, input).unwrap_or_default();
            let mut data = json!({
                "input_text": text,
                "input_length": text.chars().count(),
                "algorithm": name,
                "hash": hash,
                "hash_length": hash.len(),
                "hash_bits": bits,
                "security_level": security,
                "recommended_use": use_case,
                "encodings": encodings(text),
            });
            if !pbkdf2.is_null() {
                data["pbkdf2"] = pbkdf2;
            }
            return Ok(HandlerOutcome::success(json!({
                "type": "hash_generation",
                "data": data,
                "technical_details": {
                    "character_set": "hexadecimal",
                    "collision_resistance": if bits >= 256 { "high" } else { "moderate" },
                    "preimage_resistance": "high",
                    "performance": if bits <= 256 { "fast" } else { "moderate" },
                },
            })));
        }

        let mut all = Map::new();
        for (name, bits, security, _) in ALGORITHMS {
            all.insert(
                name.to_string(),
                json!({
                    "hash": digest_hex(name, input),
                    "bits": bits,
                    "security": security,
                }),
            );
        }

        Ok(HandlerOutcome::success(json!({
            "type": "hash_generation",
            "data": {
                "input_text": text,
                "input_length": text.chars().count(),
                "algorithms": all,
                "encodings": encodings(text),
                "pbkdf2": pbkdf2,
            },
            "comparison": {
                "fastest": "md5",
                "most_secure": "sha3_512",
                "recommended_general": "sha256",
                "recommended_passwords": "pbkdf2 with salt",
            },
            "security_notes": [
                "Use SHA-256 or SHA-3 for general purpose hashing",
                "Always use salt with PBKDF2 for password hashing",
                "MD5 and SHA-1 are cryptographically broken",
                "Consider bcrypt or argon2 for password storage",
            ],
        })))
    }
}
