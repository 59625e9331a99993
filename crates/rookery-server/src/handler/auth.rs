use super::{AppJson, AppState, blocking};
use crate::auth::BearerToken;
use crate::error::ApiError;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use rookery_core::auth::AccessToken;
use rookery_store::User;
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// POST /users
pub async fn create_user(
    State(state): State<AppState>,
    AppJson(body): AppJson<Credentials>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = blocking(&state, move |r| r.create_user(&body.email, &body.password)).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    AppJson(body): AppJson<Credentials>,
) -> Result<Json<AccessToken>, ApiError> {
    let token = blocking(&state, move |r| r.login(&body.email, &body.password)).await?;
    Ok(Json(token))
}

/// POST /logout
pub async fn logout(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<Value>, ApiError> {
    blocking(&state, move |r| r.logout(&token)).await?;
    Ok(Json(json!({ "detail": "logged out" })))
}
