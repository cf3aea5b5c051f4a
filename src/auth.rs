use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use model::entities::user;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::Settings;
use crate::schemas::{api_error, ApiError, AppState};

/// Claims carried by an issued bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username
    pub sub: String,
    pub uid: i32,
    /// User type code (`S`, `D`, `R`, `A`)
    pub role: String,
    pub iat: u64,
    pub exp: u64,
    /// Token id, used for revocation on logout
    pub jti: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,
    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("Token has been revoked")]
    Revoked,
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "MISSING_TOKEN",
            AuthError::InvalidToken(_) => "INVALID_TOKEN",
            AuthError::Revoked => "TOKEN_REVOKED",
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        api_error(StatusCode::UNAUTHORIZED, err.code(), err.to_string())
    }
}

/// Sign a token for `user`, valid for the configured lifetime.
pub fn issue_token(settings: &Settings, user: &user::Model) -> Result<(String, Claims), AuthError> {
    let now = Utc::now().timestamp().max(0) as u64;
    let claims = Claims {
        sub: user.username.clone(),
        uid: user.id,
        role: user.user_type.code().to_string(),
        iat: now,
        exp: now + settings.token_ttl_secs,
        jti: Uuid::new_v4().to_string(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
    )?;
    debug!("Issued token {} for user '{}'", claims.jti, claims.sub);
    Ok((token, claims))
}

pub fn decode_token(settings: &Settings, token: &str) -> Result<Claims, AuthError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

/// Extractor for requests carrying a valid, non-revoked bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub claims: Claims,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(AuthError::MissingToken)?;

        let claims = decode_token(&state.settings, token.trim()).map_err(|e| {
            warn!("Rejected bearer token: {}", e);
            e
        })?;

        if state.revoked_tokens.contains_key(&claims.jti) {
            warn!("Revoked token {} presented by '{}'", claims.jti, claims.sub);
            return Err(AuthError::Revoked.into());
        }

        Ok(Self { claims })
    }
}
