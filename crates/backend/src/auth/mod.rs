//! Google OAuth login and JWT session handling.

pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod types;

pub use middleware::{build_auth_cookie, extract_claims, require_user};
pub use types::{AuthConfig, Claims};
