use super::{AppJson, AppPath, AppQuery, AppState, PageQuery, blocking};
use crate::auth::CurrentUser;
use crate::error::ApiError;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use rookery_core::messaging::{ConversationSummary, DEFAULT_MESSAGE_PAGE_LIMIT, MessageView};
use rookery_store::Conversation;
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
pub struct MessageBody {
    pub content: String,
}

/// GET /conversations
pub async fn list_conversations(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<Json<Vec<ConversationSummary>>, ApiError> {
    let page = query.page();
    Ok(Json(blocking(&state, move |r| r.list_conversations(me, page)).await?))
}

/// POST /conversations/{other_user_id}
pub async fn get_or_create_conversation(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    AppPath(other): AppPath<i64>,
) -> Result<Json<Conversation>, ApiError> {
    let conv = blocking(&state, move |r| r.get_or_create_conversation(me, other)).await?;
    Ok(Json(conv))
}

/// GET /conversations/{id}/messages
pub async fn list_messages(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    AppPath(conversation_id): AppPath<i64>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<Json<Vec<MessageView>>, ApiError> {
    let page = query.page_or(DEFAULT_MESSAGE_PAGE_LIMIT);
    let messages = blocking(&state, move |r| r.list_messages(conversation_id, me, page)).await?;
    Ok(Json(messages))
}

/// POST /conversations/{id}/messages
pub async fn send_message(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    AppPath(conversation_id): AppPath<i64>,
    AppJson(body): AppJson<MessageBody>,
) -> Result<(StatusCode, Json<MessageView>), ApiError> {
    let message =
        blocking(&state, move |r| r.send_message(conversation_id, me, &body.content)).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// GET /conversations/{id}/unread_count
pub async fn unread_count(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    AppPath(conversation_id): AppPath<i64>,
) -> Result<Json<Value>, ApiError> {
    let count = blocking(&state, move |r| r.unread_count(conversation_id, me)).await?;
    Ok(Json(json!({ "unread_count": count })))
}

/// POST /conversations/{id}/mark_read
pub async fn mark_read(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    AppPath(conversation_id): AppPath<i64>,
) -> Result<Json<Value>, ApiError> {
    let updated = blocking(&state, move |r| r.mark_read(conversation_id, me)).await?;
    Ok(Json(json!({ "detail": "messages marked as read", "updated": updated })))
}
