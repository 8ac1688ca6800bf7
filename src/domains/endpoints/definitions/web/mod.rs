//! Web reference endpoints under `/api/web/`.

pub mod http_status;
pub mod mime_type;
pub mod user_agent;

pub use http_status::HttpStatusTool;
pub use mime_type::MimeTypeTool;
pub use user_agent::UserAgentTool;
