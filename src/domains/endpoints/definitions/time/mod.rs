//! Time endpoints under `/api/time/`.

pub mod timestamp;
pub mod timezone;

pub use timestamp::TimestampTool;
pub use timezone::TimezoneTool;
