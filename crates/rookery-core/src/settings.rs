use rookery_crypto::Quota;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

/// Per-endpoint admission quotas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub login: Quota,
    pub conversation: Quota,
    pub send_message: Quota,
    pub create_post: Quota,
    pub create_comment: Quota,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            login: Quota::new(5, 60),
            conversation: Quota::new(30, 60),
            send_message: Quota::new(60, 60),
            create_post: Quota::new(30, 60),
            create_comment: Quota::new(60, 60),
        }
    }
}

/// Runtime knobs for [`crate::Rookery`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub token_ttl_secs: u64,
    pub limits: Limits,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            limits: Limits::default(),
        }
    }
}

impl Limits {
    /// The widest window of any endpoint.
    pub fn longest_window(&self) -> Duration {
        Endpoint::ALL
            .iter()
            .map(|e| e.quota(self).window())
            .max()
            .unwrap_or_default()
    }
}

/// The rate-limited operations. The name is the limiter's endpoint key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Login,
    Conversation,
    SendMessage,
    CreatePost,
    CreateComment,
}

impl Endpoint {
    pub const ALL: [Endpoint; 5] = [
        Endpoint::Login,
        Endpoint::Conversation,
        Endpoint::SendMessage,
        Endpoint::CreatePost,
        Endpoint::CreateComment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Login => "login",
            Endpoint::Conversation => "conversation",
            Endpoint::SendMessage => "send_message",
            Endpoint::CreatePost => "create_post",
            Endpoint::CreateComment => "create_comment",
        }
    }

    pub fn quota(&self, limits: &Limits) -> Quota {
        match self {
            Endpoint::Login => limits.login,
            Endpoint::Conversation => limits.conversation,
            Endpoint::SendMessage => limits.send_message,
            Endpoint::CreatePost => limits.create_post,
            Endpoint::CreateComment => limits.create_comment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_window_covers_every_endpoint() {
        let mut limits = Limits::default();
        assert_eq!(limits.longest_window(), Duration::from_secs(60));
        limits.create_comment = Quota::new(10, 3600);
        assert_eq!(limits.longest_window(), Duration::from_secs(3600));
    }
}
