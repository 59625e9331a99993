use super::{AppJson, AppPath, AppQuery, AppState, PageQuery, blocking};
use crate::auth::CurrentUser;
use crate::error::ApiError;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use rookery_store::{Comment, Post, PostWithStats};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
pub struct ContentBody {
    pub content: String,
}

/// POST /posts
pub async fn create_post(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    AppJson(body): AppJson<ContentBody>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let post = blocking(&state, move |r| r.create_post(me, &body.content)).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /posts
pub async fn list_posts(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<Json<Vec<PostWithStats>>, ApiError> {
    let page = query.page();
    Ok(Json(blocking(&state, move |r| r.list_posts(page)).await?))
}

/// GET /posts/feed
pub async fn feed(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<Json<Vec<PostWithStats>>, ApiError> {
    let page = query.page();
    Ok(Json(blocking(&state, move |r| r.feed(me, page)).await?))
}

/// GET /posts/me
pub async fn my_posts(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<Json<Vec<PostWithStats>>, ApiError> {
    let page = query.page();
    Ok(Json(blocking(&state, move |r| r.user_posts(me, page)).await?))
}

/// GET /posts/user/{user_id}
pub async fn user_posts(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<i64>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<Json<Vec<PostWithStats>>, ApiError> {
    let page = query.page();
    Ok(Json(blocking(&state, move |r| r.user_posts(user_id, page)).await?))
}

/// GET /posts/{id}
pub async fn get_post(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<PostWithStats>, ApiError> {
    Ok(Json(blocking(&state, move |r| r.get_post(id)).await?))
}

/// PUT /posts/{id}
pub async fn update_post(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    AppPath(id): AppPath<i64>,
    AppJson(body): AppJson<ContentBody>,
) -> Result<Json<Post>, ApiError> {
    let post = blocking(&state, move |r| r.update_post(me, id, &body.content)).await?;
    Ok(Json(post))
}

/// DELETE /posts/{id}
pub async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    AppPath(id): AppPath<i64>,
) -> Result<StatusCode, ApiError> {
    blocking(&state, move |r| r.delete_post(me, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /posts/{id}/comments
pub async fn create_comment(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    AppPath(post_id): AppPath<i64>,
    AppJson(body): AppJson<ContentBody>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let comment = blocking(&state, move |r| r.create_comment(me, post_id, &body.content)).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// GET /posts/{id}/comments
pub async fn list_comments(
    State(state): State<AppState>,
    AppPath(post_id): AppPath<i64>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let page = query.page();
    Ok(Json(blocking(&state, move |r| r.list_comments(post_id, page)).await?))
}

/// POST /posts/{id}/like
pub async fn toggle_like(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    AppPath(post_id): AppPath<i64>,
) -> Result<Json<Value>, ApiError> {
    let status = blocking(&state, move |r| r.toggle_like(me, post_id)).await?;
    Ok(Json(json!({ "status": status })))
}
