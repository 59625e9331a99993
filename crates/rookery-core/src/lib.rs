//! Domain operations over the store: accounts, the follow graph, posts,
//! encrypted 1:1 messaging and notifications.
//!
//! Every method is synchronous. Mutating operations that carry a quota
//! consult the shared [`RateLimiter`] before touching the store.

pub mod auth;
pub mod error;
pub mod messaging;
pub mod notifications;
pub mod posts;
pub mod settings;
pub mod social;


pub use error::{CoreError, ErrorKind, Result};
pub use settings::{Endpoint, Limits, Settings};

use rookery_crypto::{CheckResult, MessageCipher, RateLimiter};
use rookery_store::Store;

/// Shared service state: the store, the message cipher, the admission
/// limiter and the runtime settings.
pub struct Rookery {
    store: Store,
    cipher: MessageCipher,
    limiter: RateLimiter,
    settings: Settings,
}

impl Rookery {
    pub fn new(store: Store, cipher: MessageCipher, settings: Settings) -> Self {
        Self {
            store,
            cipher,
            limiter: RateLimiter::new(),
            settings,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Admit one call of `identifier` to `endpoint` or fail with `RateLimited`.
    pub(crate) fn admit(&self, identifier: &str, endpoint: Endpoint) -> Result<()> {
        let quota = endpoint.quota(&self.settings.limits);
        match self.limiter.check(identifier, endpoint.as_str(), quota) {
            CheckResult::Allowed => Ok(()),
            CheckResult::RateLimited { retry_after } => Err(CoreError::RateLimited {
                endpoint: endpoint.as_str(),
                retry_after,
            }),
        }
    }

    /// Forget limiter keys idle for longer than any window. Returns how
    /// many were dropped.
    pub fn sweep_rate_limits(&self) -> usize {
        let dropped = self.limiter.cleanup(self.settings.limits.longest_window());
        if dropped > 0 {
            tracing::debug!(dropped, remaining = self.limiter.len(), "rate limit keys swept");
        }
        dropped
    }

    /// Store liveness.
    pub fn health(&self) -> Result<()> {
        self.store.ping()?;
        Ok(())
    }
}

/// Reject empty (after trimming) or over-long text.
pub(crate) fn validate_text(field: &str, text: &str, max_chars: usize) -> Result<()> {
    if text.trim().is_empty() {
        return Err(CoreError::InvalidInput(format!("{field} cannot be empty")));
    }
    if text.chars().count() > max_chars {
        return Err(CoreError::InvalidInput(format!(
            "{field} must be {max_chars} characters or less"
        )));
    }
    Ok(())
}
