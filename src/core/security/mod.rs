// Security module for admin access
//
// Admin requests carry a token in the path (`/api/wanga~<token>/...`). The
// token is checked by exact match against the configured allow-list and
// never echoed back in responses or logs.

pub mod admin_token;

pub use admin_token::{
    ADMIN_SEGMENT_PREFIX, AdminPath, AdminTokenError, AdminTokens, parse_admin_path,
};
