use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use rookery_core::error::retry_after_secs;
use rookery_core::{CoreError, ErrorKind};
use serde_json::json;

/// Error half of every handler. Renders as `{"code": ..., "message": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    retry_after_secs: Option<u64>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            retry_after_secs: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_input", message)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthenticated", message)
    }

    /// Logs `detail`; the client only sees a generic message.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!(err = %detail, "internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", "internal error")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        let kind = e.kind();
        if kind == ErrorKind::Internal {
            return Self::internal(&e);
        }
        let retry_after_secs = match &e {
            CoreError::RateLimited { retry_after, .. } => Some(retry_after_secs(retry_after)),
            _ => None,
        };
        Self {
            status: status_for(kind),
            code: e.code(),
            message: e.public_message(),
            retry_after_secs,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "code": self.code, "message": self.message }));
        let mut response = (self.status, body).into_response();
        if let Some(secs) = self.retry_after_secs {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn rate_limit_maps_to_429_with_retry_after() {
        let err = ApiError::from(CoreError::RateLimited {
            endpoint: "login",
            retry_after: Duration::from_millis(12_300),
        });
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.code(), "rate_limited");

        let response = err.into_response();
        assert_eq!(response.headers()[header::RETRY_AFTER], "13");
    }

    #[test]
    fn precondition_statuses() {
        let cases = [
            (CoreError::SelfConversation, StatusCode::BAD_REQUEST),
            (CoreError::FollowRequirementNotMet, StatusCode::FORBIDDEN),
            (CoreError::NotParticipant, StatusCode::FORBIDDEN),
            (CoreError::TargetNotFound, StatusCode::NOT_FOUND),
            (CoreError::ConversationNotFound, StatusCode::NOT_FOUND),
            (CoreError::InvalidCredentials, StatusCode::FORBIDDEN),
            (CoreError::EmailTaken, StatusCode::CONFLICT),
            (CoreError::Unauthenticated, StatusCode::UNAUTHORIZED),
        ];
        for (core, status) in cases {
            assert_eq!(ApiError::from(core).status(), status);
        }
    }

    #[test]
    fn internal_detail_is_hidden() {
        let err = ApiError::from(CoreError::Store(rookery_store::StoreError::Poisoned));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "internal error");
    }
}
