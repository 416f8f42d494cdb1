//! Platform authentication helpers.
//!
//! A request is authenticated when its bearer token is a JWT signed with the
//! configured secret and a session row still holds that exact token.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use platform_api::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

pub type UserId = i32;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub session_ttl_minutes: i64,
}

impl AuthConfig {
    pub fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(self.jwt_secret.as_bytes())
    }

    pub fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(self.jwt_secret.as_bytes())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<usize>,
    /// Makes every issued token distinct, even within the same second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

/// Lookup of live sessions by the token they were issued with.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn session_exists(&self, token: &str) -> anyhow::Result<bool>;
}

pub fn issue_token(user_id: UserId, config: &AuthConfig) -> jsonwebtoken::errors::Result<String> {
    let now = Utc::now();
    let exp = now
        .checked_add_signed(Duration::minutes(config.session_ttl_minutes))
        .unwrap_or(now)
        .timestamp() as usize;
    let claims = SessionClaims {
        user_id,
        iat: Some(now.timestamp() as usize),
        exp: Some(exp),
        jti: Some(Uuid::new_v4().to_string()),
    };
    jsonwebtoken::encode(&Header::default(), &claims, &config.encoding_key())
}

/// Tokens without `exp` are accepted; an `exp` in the past is not.
pub fn decode_token(
    token: &str,
    config: &AuthConfig,
) -> jsonwebtoken::errors::Result<SessionClaims> {
    let mut validation = Validation::default();
    validation.required_spec_claims.clear();
    jsonwebtoken::decode::<SessionClaims>(token, &config.decoding_key(), &validation)
        .map(|data| data.claims)
}

/// Pulls the token out of an `Authorization: Bearer <token>` value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[derive(Clone)]
pub struct Authenticator {
    config: Arc<AuthConfig>,
    sessions: Arc<dyn SessionStore>,
}

impl Authenticator {
    pub fn new(config: Arc<AuthConfig>, sessions: Arc<dyn SessionStore>) -> Self {
        Self { config, sessions }
    }

    /// Resolves the raw `Authorization` header to a verified user id.
    pub async fn authenticate(&self, header: Option<&str>) -> ApiResult<UserId> {
        let token = header
            .and_then(bearer_token)
            .ok_or(ApiError::Unauthorized)?;
        let claims = decode_token(token, &self.config).map_err(|err| {
            debug!(error = %err, "rejected bearer token");
            ApiError::Unauthorized
        })?;
        if !self.sessions.session_exists(token).await? {
            debug!(user_id = claims.user_id, "no session for token");
            return Err(ApiError::Unauthorized);
        }
        Ok(claims.user_id)
    }
}
