use crate::error::ApiError;
use crate::handler::{AppState, blocking};
use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

/// The raw token from `Authorization: Bearer <token>`.
pub struct BearerToken(pub String);

/// The authenticated caller's user id.
pub struct CurrentUser(pub i64);

fn parse_bearer(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| ApiError::unauthenticated("missing bearer token"))?
            .to_str()
            .map_err(|_| ApiError::unauthenticated("malformed authorization header"))?;
        let token = parse_bearer(value)
            .ok_or_else(|| ApiError::unauthenticated("malformed authorization header"))?;
        Ok(Self(token.to_string()))
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let user_id = blocking(state, move |r| r.authenticate(&token)).await?;
        Ok(Self(user_id))
    }
}
