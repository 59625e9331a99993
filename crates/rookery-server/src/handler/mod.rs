pub mod auth;
pub mod messaging;
pub mod notifications;
pub mod posts;
pub mod social;

use crate::error::ApiError;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::routing::{get, post};
use axum::{Json, Router};
use rookery_core::Rookery;
use rookery_store::Page;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub type AppState = Arc<Rookery>;

/// Build the API router. CORS is left to the caller.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/users", post(auth::create_user))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/follow/{user_id}", post(social::toggle_follow))
        .route("/profile/me", get(social::my_profile))
        .route("/profile/{user_id}", get(social::profile))
        .route("/posts", post(posts::create_post).get(posts::list_posts))
        .route("/posts/feed", get(posts::feed))
        .route("/posts/me", get(posts::my_posts))
        .route("/posts/user/{user_id}", get(posts::user_posts))
        .route(
            "/posts/{id}",
            get(posts::get_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        .route(
            "/posts/{id}/comments",
            post(posts::create_comment).get(posts::list_comments),
        )
        .route("/posts/{id}/like", post(posts::toggle_like))
        .route("/conversations", get(messaging::list_conversations))
        .route("/conversations/{id}", post(messaging::get_or_create_conversation))
        .route(
            "/conversations/{id}/messages",
            get(messaging::list_messages).post(messaging::send_message),
        )
        .route("/conversations/{id}/unread_count", get(messaging::unread_count))
        .route("/conversations/{id}/mark_read", post(messaging::mark_read))
        .route("/notifications", get(notifications::list_notifications))
        .route(
            "/notifications/mark_all_read",
            post(notifications::mark_all_read),
        )
        .route("/notifications/{id}/mark_read", post(notifications::mark_read))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health
async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    blocking(&state, |r| r.health()).await?;
    Ok(Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}

/// Run a synchronous core call on the blocking pool.
pub(crate) async fn blocking<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Rookery) -> rookery_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| ApiError::internal(format!("spawn_blocking failed: {e}")))?
        .map_err(ApiError::from)
}

/// `?limit=&offset=` on listing routes.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl PageQuery {
    pub fn page(&self) -> Page {
        Page::new(self.limit, self.offset)
    }

    pub fn page_or(&self, default_limit: u32) -> Page {
        Page::with_default(self.limit, self.offset, default_limit)
    }
}

/// `Json` whose rejection renders as an [`ApiError`].
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    ApiError::new(rejection.status(), "invalid_input", rejection.body_text())
}

/// `Path` whose rejection renders as an [`ApiError`].
pub struct AppPath<T>(pub T);

impl<T, S> FromRequestParts<S> for AppPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Path::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Path(value)) => Ok(Self(value)),
            Err(rejection) => Err(path_rejection(rejection)),
        }
    }
}

fn path_rejection(rejection: PathRejection) -> ApiError {
    ApiError::new(rejection.status(), "invalid_input", rejection.body_text())
}

/// `Query` whose rejection renders as an [`ApiError`].
pub struct AppQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for AppQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Query::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::new(
                rejection.status(),
                "invalid_input",
                rejection.body_text(),
            )),
        }
    }
}
