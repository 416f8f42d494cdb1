use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use platform_api::ApiError;
use products_hotels::UserId;

use crate::http::AppState;

/// A caller whose bearer token maps to a live session.
#[derive(Clone, Copy, Debug)]
pub struct AuthUser {
    pub id: UserId,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        let id = state.authenticator.authenticate(header).await?;
        Ok(Self { id })
    }
}
