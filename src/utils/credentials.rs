use std::time::Duration;

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::db::models::role::Role;

/// JWT claims carried by every session token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject - user ID as string
    pub sub: String,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Option<i32> {
        self.sub.parse().ok()
    }
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

/// Password hashing and session token issuance.
#[derive(Clone)]
pub struct Credentials {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    cost: u32,
}

impl Credentials {
    pub fn new(secret: &[u8], ttl: Duration, cost: u32) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
            cost,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.jwt_secret.as_bytes(), config.token_ttl, config.bcrypt_cost)
    }

    pub fn hash_password(&self, plain: &str) -> Result<String, CredentialError> {
        Ok(hash(plain, self.cost)?)
    }

    pub fn verify_password(&self, plain: &str, hashed: &str) -> Result<bool, CredentialError> {
        Ok(verify(plain, hashed)?)
    }

    pub fn issue(&self, user_id: i32, role: Role) -> Result<String, CredentialError> {
        let now = Utc::now().timestamp().max(0) as usize;
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            iat: now,
            exp: now + self.ttl.as_secs() as usize,
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Bad signature, malformed token and expiry all surface as `CredentialError::Token`.
    pub fn decode(&self, token: &str) -> Result<Claims, CredentialError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Ok(decode::<Claims>(token, &self.decoding, &validation)?.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials::new(b"unit-test-secret", Duration::from_secs(7200), 4)
    }

    #[test]
    fn issued_token_decodes_to_user_and_role() {
        let creds = credentials();
        let token = creds.issue(7, Role::LabHead).unwrap();
        let claims = creds.decode(&token).unwrap();

        assert_eq!(claims.user_id(), Some(7));
        assert_eq!(claims.role, Role::LabHead);
        assert_eq!(claims.exp - claims.iat, 7200);
    }

    #[test]
    fn rejects_token_signed_with_another_secret() {
        let token = Credentials::new(b"other-secret", Duration::from_secs(60), 4)
            .issue(1, Role::Dean)
            .unwrap();
        assert!(credentials().decode(&token).is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let creds = credentials();
        let past = (Utc::now().timestamp() - 120) as usize;
        let claims = Claims {
            sub: "3".into(),
            role: Role::Requester,
            iat: past - 60,
            exp: past,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &creds.encoding).unwrap();
        assert!(creds.decode(&token).is_err());
    }

    #[test]
    fn password_hash_verifies_only_the_original_password() {
        let creds = credentials();
        let hashed = creds.hash_password("password").unwrap();
        assert!(creds.verify_password("password", &hashed).unwrap());
        assert!(!creds.verify_password("Password", &hashed).unwrap());
    }
}
