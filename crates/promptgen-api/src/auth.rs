//! Session token authentication.
//!
//! The identity backend is the system of record; the API mints short-lived
//! HS256 session tokens at login/register and verifies them on every
//! authenticated request via the [`AuthUser`] extractor.

use std::time::Duration;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use promptgen_models::{UserProfile, UserRole};

use crate::error::ApiError;
use crate::state::AppState;

/// Session token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Email
    pub email: String,
    /// Role at mint time
    pub role: String,
    /// Issued at
    pub iat: i64,
    /// Expiration
    pub exp: i64,
}

/// Mint a session token for a profile.
pub fn mint_token(
    profile: &UserProfile,
    secret: &str,
    ttl: Duration,
) -> Result<String, ApiError> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: profile.id.clone(),
        email: profile.email.clone(),
        role: profile.role.as_str().to_string(),
        iat: now,
        exp: now + ttl.as_secs() as i64,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::internal(format!("Failed to mint session token: {}", e)))
}

/// Verify a session token and return its claims.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::unauthorized("Invalid or expired session token"))
}

/// Authenticated user extracted from the Authorization header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    pub role: UserRole,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            uid: claims.sub,
            email: claims.email,
            role: UserRole::from_str(&claims.role).unwrap_or_default(),
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Expected bearer token"))?;

        let claims = verify_token(token, &state.config.auth_secret)?;
        Ok(claims.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile() -> UserProfile {
        let mut profile = UserProfile::new("user-1", "user@demo.com");
        profile.set_role(UserRole::Admin);
        profile
    }

    #[test]
    fn test_token_round_trip() {
        let token = mint_token(&sample_profile(), "secret", Duration::from_secs(60)).unwrap();
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.role, "admin");

        let user = AuthUser::from(claims);
        assert_eq!(user.role, UserRole::Admin);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = mint_token(&sample_profile(), "secret", Duration::from_secs(60)).unwrap();
        assert!(verify_token(&token, "other-secret").is_err());
    }
}
