//! Text utility endpoints under `/api/tools/`.

use schemars::JsonSchema;
use serde::Deserialize;

pub mod acronym;
pub mod anagram;
pub mod analyze;
pub mod base64;
pub mod binary;
pub mod hash;
pub mod morse;
pub mod palindrome;
pub mod qrcode;
pub mod uuid;

pub use self::acronym::AcronymTool;
pub use self::anagram::AnagramTool;
pub use self::analyze::AnalyzeTool;
pub use self::base64::Base64Tool;
pub use self::binary::BinaryTool;
pub use self::hash::HashTool;
pub use self::morse::MorseTool;
pub use self::palindrome::PalindromeTool;
pub use self::qrcode::QrCodeTool;
pub use self::uuid::UuidTool;

/// Direction of a reversible text transformation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[default]
    Encode,
    Decode,
}
