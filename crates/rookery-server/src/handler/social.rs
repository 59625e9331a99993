use super::{AppPath, AppState, blocking};
use crate::auth::CurrentUser;
use crate::error::ApiError;
use axum::Json;
use axum::extract::State;
use rookery_core::social::Profile;
use serde_json::{Value, json};

/// POST /follow/{user_id}
pub async fn toggle_follow(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    AppPath(target): AppPath<i64>,
) -> Result<Json<Value>, ApiError> {
    let status = blocking(&state, move |r| r.toggle_follow(me, target)).await?;
    Ok(Json(json!({ "status": status })))
}

/// GET /profile/me
pub async fn my_profile(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
) -> Result<Json<Profile>, ApiError> {
    let profile = blocking(&state, move |r| r.profile(me)).await?;
    Ok(Json(profile))
}

/// GET /profile/{user_id}
pub async fn profile(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<i64>,
) -> Result<Json<Profile>, ApiError> {
    let profile = blocking(&state, move |r| r.profile(user_id)).await?;
    Ok(Json(profile))
}
