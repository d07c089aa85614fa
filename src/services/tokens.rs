// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access and refresh token issuance and verification.
//!
//! Access tokens are short-lived and stateless. Refresh tokens are
//! longer-lived and carry only the user ID plus a random `jti`; they are
//! signed with a separate secret. Issuing a refresh token does not persist
//! it: the session flow stores it on the user record, and that stored value
//! is what makes a refresh token usable.

use crate::config::Config;
use crate::error::AppError;
use crate::models::User;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Claims carried by an access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    /// Subject (user ID)
    pub sub: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Claims carried by a refresh token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Unique token ID so consecutive tokens never collide
    pub jti: String,
    pub iat: u64,
    pub exp: u64,
}

/// A freshly issued access/refresh pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signs and verifies both token kinds.
#[derive(Clone)]
pub struct TokenService {
    access_secret: Vec<u8>,
    refresh_secret: Vec<u8>,
    access_ttl_secs: u64,
    refresh_ttl_secs: u64,
}

impl TokenService {
    pub fn new(config: &Config) -> Self {
        Self {
            access_secret: config.access_token_secret.clone(),
            refresh_secret: config.refresh_token_secret.clone(),
            access_ttl_secs: config.access_token_ttl_secs,
            refresh_ttl_secs: config.refresh_token_ttl_secs,
        }
    }

    /// Lifetime of a refresh token, used for the cookie `Max-Age`.
    pub fn refresh_ttl_secs(&self) -> u64 {
        self.refresh_ttl_secs
    }

    pub fn access_ttl_secs(&self) -> u64 {
        self.access_ttl_secs
    }

    pub fn issue_access_token(&self, user: &User) -> Result<String, AppError> {
        let now = now_secs()?;
        let claims = AccessClaims {
            sub: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            iat: now,
            exp: now.saturating_add(self.access_ttl_secs),
        };
        sign(&claims, &self.access_secret)
    }

    pub fn issue_refresh_token(&self, user: &User) -> Result<String, AppError> {
        let now = now_secs()?;
        let claims = RefreshClaims {
            sub: user.id.clone(),
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now,
            exp: now.saturating_add(self.refresh_ttl_secs),
        };
        sign(&claims, &self.refresh_secret)
    }

    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(user)?,
            refresh_token: self.issue_refresh_token(user)?,
        })
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, AppError> {
        verify(token, &self.access_secret)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, AppError> {
        verify(token, &self.refresh_secret)
    }
}

fn now_secs() -> Result<u64, AppError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::internal(format!("System time error: {}", e)))?;
    Ok(now.as_secs())
}

/// Sign a claims set with HS256.
pub fn sign<C: Serialize>(claims: &C, secret: &[u8]) -> Result<String, AppError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AppError::internal(format!("JWT creation failed: {}", e)))
}

/// Verify signature and expiry, returning the decoded claims.
pub fn verify<C: DeserializeOwned>(token: &str, secret: &[u8]) -> Result<C, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<C>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "Token verification failed");
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::Unauthorized("Token has expired".to_string())
                }
                _ => AppError::Unauthorized("Invalid token".to_string()),
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;

    fn test_user() -> User {
        User::new(NewUser {
            username: "ana".to_string(),
            email: "ana@x.com".to_string(),
            full_name: "Ana A".to_string(),
            password: "p1".to_string(),
            avatar: "https://media.example/a.png".to_string(),
            cover_image: String::new(),
        })
        .unwrap()
    }

    #[test]
    fn test_access_token_roundtrip() {
        let tokens = TokenService::new(&Config::test_default());
        let user = test_user();

        let token = tokens.issue_access_token(&user).unwrap();
        let claims = tokens.verify_access(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.username, "ana");
        assert_eq!(claims.email, "ana@x.com");
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn test_secrets_are_not_interchangeable() {
        let tokens = TokenService::new(&Config::test_default());
        let user = test_user();

        let access = tokens.issue_access_token(&user).unwrap();
        let refresh = tokens.issue_refresh_token(&user).unwrap();

        assert!(tokens.verify_refresh(&access).is_err());
        assert!(tokens.verify_access(&refresh).is_err());
    }

    #[test]
    fn test_refresh_tokens_are_unique() {
        let tokens = TokenService::new(&Config::test_default());
        let user = test_user();

        let a = tokens.issue_refresh_token(&user).unwrap();
        let b = tokens.issue_refresh_token(&user).unwrap();
        assert_ne!(a, b);

        let claims = tokens.verify_refresh(&a).unwrap();
        assert_eq!(claims.sub, user.id);
    }

    #[test]
    fn test_expired_token_rejected() {
        let secret = b"secret";
        let now = now_secs().unwrap();
        let claims = RefreshClaims {
            sub: "u1".to_string(),
            jti: "j".to_string(),
            iat: now - 120,
            exp: now - 60,
        };
        let token = sign(&claims, secret).unwrap();

        match verify::<RefreshClaims>(&token, secret) {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, "Token has expired"),
            other => panic!("expected expiry error, got {:?}", other.map(|c| c.sub)),
        }
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(matches!(
            verify::<AccessClaims>("invalid.token.here", b"secret"),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expiry_saturates_instead_of_wrapping() {
        let mut config = Config::test_default();
        config.access_token_ttl_secs = u64::MAX;
        config.refresh_token_ttl_secs = u64::MAX;
        let tokens = TokenService::new(&config);
        let user = test_user();

        let access = tokens.issue_access_token(&user).unwrap();
        let claims = tokens.verify_access(&access).unwrap();
        assert_eq!(claims.exp, u64::MAX);
        assert!(claims.iat > 0);

        let refresh = tokens.issue_refresh_token(&user).unwrap();
        assert_eq!(tokens.verify_refresh(&refresh).unwrap().exp, u64::MAX);
    }
}
