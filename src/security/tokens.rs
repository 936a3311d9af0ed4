//! HS256 token issuing and verification.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sha2::{Digest, Sha256};

use super::claims::UserClaims;

/// Issue a token for `subject` valid for `ttl`.
pub fn issue_token(
    subject: &str,
    secret: &str,
    ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let exp = (Utc::now() + ttl).timestamp();
    let claims = UserClaims {
        sub: subject.to_string(),
        name: None,
        roles: None,
        exp: usize::try_from(exp).unwrap_or(0),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Verify a token and return its claims.
pub fn verify_token(
    token: &str,
    secret: &str,
) -> Result<UserClaims, jsonwebtoken::errors::Error> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    decode::<UserClaims>(token, &key, &Validation::default()).map(|data| data.claims)
}

/// Lowercase hex SHA-256 of a password, as stored in `security.users`.
#[must_use]
pub fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

/// Check a login against configured users.
#[must_use]
pub fn verify_password(users: &HashMap<String, String>, username: &str, password: &str) -> bool {
    users
        .get(username)
        .is_some_and(|stored| stored.eq_ignore_ascii_case(&hash_password(password)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let token = issue_token("alice", "secret", Duration::minutes(30)).unwrap();
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, "alice");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_token("alice", "secret", Duration::minutes(30)).unwrap();
        assert!(verify_token(&token, "other").is_err());
    }

    #[test]
    fn test_expired_rejected() {
        // Past the default 60s leeway
        let token = issue_token("alice", "secret", Duration::minutes(-5)).unwrap();
        assert!(verify_token(&token, "secret").is_err());
    }

    #[test]
    fn test_verify_password() {
        let users = HashMap::from([("alice".to_string(), hash_password("wonderland"))]);
        assert!(verify_password(&users, "alice", "wonderland"));
        assert!(!verify_password(&users, "alice", "looking-glass"));
        assert!(!verify_password(&users, "bob", "wonderland"));
        assert_eq!(
            hash_password("wonderland"),
            "a71a7c7011f53a1bab3642ec2ce12593f05230ace8de1e3e7645f69efac1443d"
        );
    }
}
