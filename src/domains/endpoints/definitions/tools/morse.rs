//! Morse code endpoint.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

use crate::domains::endpoints::{Endpoint, EndpointError, HandlerOutcome, required};

use super::Action;

/// International Morse code table; space maps to the word separator `/`.
const MORSE_TABLE: &[(char, &str)] = &[
    ('A', ".-"),
    ('B', "-..."),
    ('C', "-.-."),
    ('D', "-.."),
    ('E', "."),
    ('F', "..-."),
    ('G', "--."),
    ('H', "...."),
    ('I', ".."),
    ('J', ".---"),
    ('K', "-.-"),
    ('L', ".-.."),
    ('M', "--"),
    ('N', "-."),
    ('O', "---"),
    ('P', ".--."),
    ('Q', "--.-"),
    ('R', ".-."),
    ('S', "..."),
    ('T', "-"),
    ('U', "..-"),
    ('V', "...-"),
    ('W', ".--"),
    ('X', "-..-"),
    ('Y', "-.--"),
    ('Z', "--.."),
    ('0', "-----"),
    ('1', ".----"),
    ('2', "..---"),
    ('3', "...--"),
    ('4', "....-"),
    ('5', "....."),
    ('6', "-...."),
    ('7', "--..."),
    ('8', "---.."),
    ('9', "----."),
    ('.', ".-.-.-"),
    (',', "--..--"),
    ('?', "..--.."),
    ('\'', ".----."),
    ('!', "-.-.--"),
    ('/', "-..-."),
    ('(', "-.--."),
    (')', "-.--.-"),
    ('&', ".-..."),
    (':', "---..."),
    (';', "-.-.-."),
    ('=', "-...-"),
    ('+', ".-.-."),
    ('-', "-....-"),
    ('_', "..--.-"),
    ('"', ".-..-."),
    ('$', "...-..-"),
    ('@', ".--.-."),
    (' ', "/"),
];

fn encode_char(c: char) -> &'static str {
    let upper = c.to_ascii_uppercase();
    MORSE_TABLE
        .iter()
        .find(|(ch, _)| *ch == upper)
        .map(|(_, code)| *code)
        .unwrap_or("?")
}

fn decode_code(code: &str) -> char {
    MORSE_TABLE
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(ch, _)| *ch)
        .unwrap_or('?')
}

/// Encode text as space-separated Morse symbols.
pub fn encode(text: &str) -> String {
    text.chars().map(encode_char).collect::<Vec<_>>().join(" ")
}

/// Decode space-separated Morse symbols; unknown symbols become `?`.
pub fn decode(morse: &str) -> String {
    morse.split(' ').filter(|c| !c.is_empty()).map(decode_code).collect()
}

fn audio_pattern(morse: &str) -> String {
    morse
        .chars()
        .filter_map(|c| match c {
            '.' => Some("di"),
            '-' => Some("dah"),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parameters for the morse endpoint.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct MorseParams {
    /// Text to encode, or Morse code (space separated, `/` between words) to decode.
    pub text: Option<String>,

    #[serde(default)]
    pub action: Action,
}

pub struct MorseTool;

#[async_trait]
impl Endpoint for MorseTool {
    const CATEGORY: &'static str = "tools";
    const NAME: &'static str = "morse";
    const DESCRIPTION: &'static str = "Translate text to and from International Morse code";
    type Params = MorseParams;

    async fn execute(&self, params: MorseParams) -> Result<HandlerOutcome, EndpointError> {
        let text = required(params.text.as_deref(), "Text parameter required")?;

        let result = match params.action {
            Action::Encode => {
                let morse = encode(text);
                json!({
                    "action": "encode",
                    "original": text,
                    "morse": morse,
                    "format": "International Morse Code",
                    "audio_pattern": audio_pattern(&morse),
                    "timing": {
                        "dot": "1 unit",
                        "dash": "3 units",
                        "space_letters": "3 units",
                        "space_words": "7 units",
                    },
                })
            }
            Action::Decode => json!({
                "action": "decode",
                "original": text,
                "decoded": decode(text),
                "valid": text.chars().all(|c| matches!(c, '.' | '-' | '/' | ' ')),
                "format": "International Morse Code",
            }),
        };
        Ok(HandlerOutcome::success(result))
    }
}
