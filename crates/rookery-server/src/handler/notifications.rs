use super::{AppPath, AppQuery, AppState, PageQuery, blocking};
use crate::auth::CurrentUser;
use crate::error::ApiError;
use axum::Json;
use axum::extract::State;
use rookery_store::Notification;
use serde_json::{Value, json};

/// GET /notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let page = query.page();
    let list = blocking(&state, move |r| r.list_notifications(me, page)).await?;
    Ok(Json(list))
}

/// POST /notifications/{id}/mark_read
pub async fn mark_read(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    AppPath(id): AppPath<i64>,
) -> Result<Json<Value>, ApiError> {
    blocking(&state, move |r| r.mark_notification_read(me, id)).await?;
    Ok(Json(json!({ "detail": "notification marked as read" })))
}

/// POST /notifications/mark_all_read
pub async fn mark_all_read(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let updated = blocking(&state, move |r| r.mark_all_notifications_read(me)).await?;
    Ok(Json(json!({ "detail": "all notifications marked as read", "updated": updated })))
}
