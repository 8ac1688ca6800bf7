//! Validation endpoints under `/api/validator/`.

pub mod ip;
pub mod json;
pub mod phone;
pub mod url;

pub use self::ip::IpValidator;
pub use self::json::JsonValidator;
pub use self::phone::PhoneValidator;
pub use self::url::UrlValidator;
