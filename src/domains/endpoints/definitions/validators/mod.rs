//! Validation endpoints under `/api/validators/`.

pub mod email;
pub mod password_strength;

pub use email::EmailValidator;
pub use password_strength::PasswordStrengthValidator;
