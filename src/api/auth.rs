//! Identity tokens
//!
//! Callers are identified by an HS256 JWT carried in the `token` cookie.
//! A request without a valid token gets a fresh owner ID from the storage
//! backend and the cookie is (re)issued with the response.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Cookie key carrying the identity token.
pub const AUTH_COOKIE_NAME: &str = "token";

/// Token validity window.
const TOKEN_EXPIRY_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i32,
    pub iat: i64,
    pub exp: i64,
}

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Build the service from an optional configured secret; a missing
    /// secret gets a random one, which invalidates cookies across restarts.
    pub fn from_secret(secret: Option<&str>) -> Self {
        match secret.filter(|s| !s.is_empty()) {
            Some(secret) => Self::new(secret.as_bytes()),
            None => {
                tracing::warn!("JWT secret not configured, generating a random key");
                let mut key = [0u8; 32];
                rand::thread_rng().fill_bytes(&mut key);
                Self::new(&key)
            }
        }
    }

    pub fn create_token(&self, user_id: i32) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            user_id,
            iat: now.timestamp(),
            exp: (now + Duration::hours(TOKEN_EXPIRY_HOURS)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
    }

    pub fn claims_from_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::default();
        validation.set_required_spec_claims(&["exp"]);
        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> JwtService {
        JwtService::new(b"test_secret_key_32_bytes_long!!!")
    }

    #[test]
    fn test_create_and_validate_token() {
        let service = create_test_service();
        let token = service.create_token(42).unwrap();
        let claims = service.claims_from_token(&token).unwrap();

        assert_eq!(claims.user_id, 42);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_invalid_token_rejected() {
        let service = create_test_service();
        assert!(service.claims_from_token("invalid.token.here").is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let service = create_test_service();
        let other = JwtService::new(b"different_secret_key_32_bytes!!!");

        let token = service.create_token(1).unwrap();
        assert!(other.claims_from_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = create_test_service();

        let now = Utc::now();
        let claims = Claims {
            user_id: 1,
            iat: (now - Duration::hours(3)).timestamp(),
            exp: (now - Duration::hours(2)).timestamp(),
        };
        let encoding_key = EncodingKey::from_secret(b"test_secret_key_32_bytes_long!!!");
        let token = encode(&Header::default(), &claims, &encoding_key).unwrap();

        assert!(service.claims_from_token(&token).is_err());
    }

    #[test]
    fn test_random_secret_when_unset() {
        let service = JwtService::from_secret(None);
        let token = service.create_token(7).unwrap();
        assert_eq!(service.claims_from_token(&token).unwrap().user_id, 7);
    }
}
