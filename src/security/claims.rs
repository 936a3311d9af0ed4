use serde::{Deserialize, Serialize};

/// User id used when authentication is optional and no token was sent.
pub const ANONYMOUS_USER: &str = "anonymous";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UserClaims {
    pub sub: String, // User ID (Subject)
    pub name: Option<String>,
    pub roles: Option<Vec<String>>,
    pub exp: usize, // Expiration time (UNIX timestamp)
}

#[derive(Clone, Debug)]
pub struct UserContext {
    pub user_id: String,
    pub claims: Option<UserClaims>,
}

impl UserContext {
    /// Context for an unauthenticated request.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            user_id: ANONYMOUS_USER.to_string(),
            claims: None,
        }
    }

    /// Context for a verified token.
    #[must_use]
    pub fn from_claims(claims: UserClaims) -> Self {
        Self {
            user_id: claims.sub.clone(),
            claims: Some(claims),
        }
    }
}
