use rookery_crypto::CryptoError;
use rookery_crypto::password::PasswordError;
use rookery_store::StoreError;
use std::time::Duration;
use thiserror::Error;

/// Coarse class of a [`CoreError`], one per response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RateLimited,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    Internal,
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("rate limit exceeded for {endpoint}, retry in {}s", retry_after_secs(.retry_after))]
    RateLimited {
        endpoint: &'static str,
        retry_after: Duration,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("cannot create conversation with yourself")]
    SelfConversation,

    #[error("you cannot follow yourself")]
    SelfFollow,

    #[error("email is already registered")]
    EmailTaken,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("not authenticated")]
    Unauthenticated,

    #[error("both users must follow each other to start a conversation")]
    FollowRequirementNotMet,

    #[error("not a participant in this conversation")]
    NotParticipant,

    #[error("not allowed to modify this post")]
    NotOwner,

    #[error("user not found")]
    UserNotFound,

    #[error("target user not found")]
    TargetNotFound,

    #[error("conversation not found")]
    ConversationNotFound,

    #[error("post not found")]
    PostNotFound,

    #[error("notification not found")]
    NotificationNotFound,

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Whole seconds, rounded up so a client never retries too early.
pub fn retry_after_secs(retry_after: &Duration) -> u64 {
    let secs = retry_after.as_secs();
    if retry_after.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs.max(1)
    }
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::RateLimited { .. } => ErrorKind::RateLimited,
            CoreError::InvalidInput(_) | CoreError::SelfConversation | CoreError::SelfFollow => {
                ErrorKind::BadRequest
            }
            CoreError::Unauthenticated => ErrorKind::Unauthorized,
            CoreError::InvalidCredentials
            | CoreError::FollowRequirementNotMet
            | CoreError::NotParticipant
            | CoreError::NotOwner => ErrorKind::Forbidden,
            CoreError::UserNotFound
            | CoreError::TargetNotFound
            | CoreError::ConversationNotFound
            | CoreError::PostNotFound
            | CoreError::NotificationNotFound => ErrorKind::NotFound,
            CoreError::EmailTaken => ErrorKind::Conflict,
            CoreError::Crypto(_) | CoreError::Password(_) | CoreError::Store(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::RateLimited { .. } => "rate_limited",
            CoreError::InvalidInput(_) => "invalid_input",
            CoreError::SelfConversation => "self_conversation",
            CoreError::SelfFollow => "self_follow",
            CoreError::EmailTaken => "email_taken",
            CoreError::InvalidCredentials => "invalid_credentials",
            CoreError::Unauthenticated => "unauthenticated",
            CoreError::FollowRequirementNotMet => "follow_requirement_not_met",
            CoreError::NotParticipant => "not_participant",
            CoreError::NotOwner => "not_owner",
            CoreError::UserNotFound => "user_not_found",
            CoreError::TargetNotFound => "target_not_found",
            CoreError::ConversationNotFound => "conversation_not_found",
            CoreError::PostNotFound => "post_not_found",
            CoreError::NotificationNotFound => "notification_not_found",
            CoreError::Crypto(_) | CoreError::Password(_) | CoreError::Store(_) => "internal",
        }
    }

    /// Message safe to show a client. Internal failures are not described.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => "internal error".to_string(),
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_after_rounds_up() {
        assert_eq!(retry_after_secs(&Duration::from_millis(1500)), 2);
        assert_eq!(retry_after_secs(&Duration::from_secs(30)), 30);
        assert_eq!(retry_after_secs(&Duration::ZERO), 1);
    }

    #[test]
    fn internal_errors_are_sanitised() {
        let err = CoreError::Store(StoreError::Corrupt("secret detail".into()));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.code(), "internal");
        assert_eq!(err.public_message(), "internal error");
    }

    #[test]
    fn precondition_kinds() {
        assert_eq!(CoreError::SelfConversation.kind(), ErrorKind::BadRequest);
        assert_eq!(CoreError::FollowRequirementNotMet.kind(), ErrorKind::Forbidden);
        assert_eq!(CoreError::NotParticipant.kind(), ErrorKind::Forbidden);
        assert_eq!(CoreError::TargetNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(CoreError::ConversationNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(CoreError::EmailTaken.kind(), ErrorKind::Conflict);
        assert_eq!(CoreError::Unauthenticated.kind(), ErrorKind::Unauthorized);
    }
}
