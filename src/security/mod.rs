//! Bearer-token authentication.

pub mod claims;
pub mod middleware;
pub mod tokens;

pub use claims::{ANONYMOUS_USER, UserClaims, UserContext};
pub use middleware::auth_middleware;
pub use tokens::{hash_password, issue_token, verify_password, verify_token};
