use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// An admission quota: at most `limit` calls per sliding window of `window_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quota {
    pub limit: u32,
    pub window_secs: u64,
}

impl Quota {
    pub const fn new(limit: u32, window_secs: u64) -> Self {
        Self { limit, window_secs }
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckResult {
    Allowed,
    /// Rejected. `retry_after` is when the oldest admitted call leaves the window.
    RateLimited { retry_after: Duration },
}

impl CheckResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, CheckResult::Allowed)
    }
}

/// Sliding-window rate limiter keyed by `(identifier, endpoint)`.
///
/// Each key keeps the instants of its admitted calls in arrival order.
/// A check trims the expired prefix, rejects if `limit` calls remain in the
/// window, and otherwise records the new call. Rejected calls are never
/// recorded, so hammering a closed window does not push it forward.
///
/// The whole trim/compare/append cycle runs under the map entry's lock, so
/// two callers racing for the last slot of one key cannot both be admitted.
/// A key never holds more than `limit` instants. Keys that go quiet are
/// dropped by [`RateLimiter::cleanup`].
#[derive(Default)]
pub struct RateLimiter {
    windows: DashMap<(String, String), VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check and record one call for `identifier` on `endpoint`.
    pub fn check(&self, identifier: &str, endpoint: &str, quota: Quota) -> CheckResult {
        self.check_at(identifier, endpoint, quota, Instant::now())
    }

    fn check_at(&self, identifier: &str, endpoint: &str, quota: Quota, now: Instant) -> CheckResult {
        let window = quota.window();
        let key = (identifier.to_string(), endpoint.to_string());
        let mut entry = self.windows.entry(key.clone()).or_default();
        let admitted = entry.value_mut();

        // Early in process life `now - window` may precede the clock origin;
        // then nothing can be expired yet.
        if let Some(cutoff) = now.checked_sub(window) {
            while admitted.front().is_some_and(|&t| t < cutoff) {
                admitted.pop_front();
            }
        }

        if admitted.len() >= quota.limit as usize {
            let retry_after = admitted
                .front()
                .map(|&oldest| {
                    oldest
                        .checked_add(window)
                        .map_or(window, |t| t.saturating_duration_since(now))
                })
                .unwrap_or(window);
            let empty = admitted.is_empty();
            tracing::warn!(
                identifier = %identifier,
                endpoint = %endpoint,
                limit = quota.limit,
                window_secs = quota.window_secs,
                "rate limit exceeded"
            );
            drop(entry);
            if empty {
                self.windows.remove_if(&key, |_, admitted| admitted.is_empty());
            }
            return CheckResult::RateLimited { retry_after };
        }

        admitted.push_back(now);
        CheckResult::Allowed
    }

    /// Drop keys whose newest admitted call is at least `max_idle` old.
    /// Pass the longest window in use so no live window is forgotten.
    pub fn cleanup(&self, max_idle: Duration) -> usize {
        self.cleanup_at(max_idle, Instant::now())
    }

    fn cleanup_at(&self, max_idle: Duration, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, admitted| {
            admitted
                .back()
                .is_some_and(|&newest| now.saturating_duration_since(newest) < max_idle)
        });
        before.saturating_sub(self.windows.len())
    }

    /// Number of `(identifier, endpoint)` keys currently tracked.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const LOGIN: Quota = Quota::new(5, 60);

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn allows_up_to_limit() {
        let rl = RateLimiter::new();
        let t0 = Instant::now();
        for i in 0..5 {
            assert_eq!(
                rl.check_at("alice", "login", LOGIN, t0 + secs(i)),
                CheckResult::Allowed
            );
        }
    }

    #[test]
    fn rejects_call_past_limit() {
        let rl = RateLimiter::new();
        let t0 = Instant::now();
        for _ in 0..5 {
            assert!(rl.check_at("alice", "login", LOGIN, t0).is_allowed());
        }
        match rl.check_at("alice", "login", LOGIN, t0 + secs(10)) {
            CheckResult::RateLimited { retry_after } => assert_eq!(retry_after, secs(50)),
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[test]
    fn window_slides_instead_of_resetting() {
        let rl = RateLimiter::new();
        let t0 = Instant::now();
        // Calls at 0, 10, 20, 30, 40.
        for i in 0..5 {
            assert!(rl.check_at("alice", "login", LOGIN, t0 + secs(i * 10)).is_allowed());
        }
        assert!(!rl.check_at("alice", "login", LOGIN, t0 + secs(59)).is_allowed());

        // At 61 only the call at 0 has expired: exactly one slot opens.
        assert!(rl.check_at("alice", "login", LOGIN, t0 + secs(61)).is_allowed());
        assert!(!rl.check_at("alice", "login", LOGIN, t0 + secs(62)).is_allowed());

        // At 71 the call at 10 has expired too.
        assert!(rl.check_at("alice", "login", LOGIN, t0 + secs(71)).is_allowed());
    }

    #[test]
    fn timestamp_exactly_at_cutoff_still_counts() {
        let rl = RateLimiter::new();
        let quota = Quota::new(1, 60);
        let t0 = Instant::now();
        assert!(rl.check_at("a", "x", quota, t0).is_allowed());
        assert!(!rl.check_at("a", "x", quota, t0 + secs(60)).is_allowed());
        assert!(rl.check_at("a", "x", quota, t0 + secs(60) + Duration::from_millis(1)).is_allowed());
    }

    #[test]
    fn rejections_do_not_consume_slots() {
        let rl = RateLimiter::new();
        let quota = Quota::new(2, 60);
        let t0 = Instant::now();
        assert!(rl.check_at("a", "x", quota, t0).is_allowed());
        assert!(rl.check_at("a", "x", quota, t0).is_allowed());
        for i in 1..50 {
            assert!(!rl.check_at("a", "x", quota, t0 + secs(i)).is_allowed());
        }
        // If rejections were recorded the window would still be full here.
        assert!(rl.check_at("a", "x", quota, t0 + secs(61)).is_allowed());
    }

    #[test]
    fn identifiers_and_endpoints_are_independent() {
        let rl = RateLimiter::new();
        let quota = Quota::new(1, 60);
        let t0 = Instant::now();
        assert!(rl.check_at("alice", "login", quota, t0).is_allowed());
        assert!(!rl.check_at("alice", "login", quota, t0).is_allowed());
        assert!(rl.check_at("bob", "login", quota, t0).is_allowed());
        assert!(rl.check_at("alice", "create_post", quota, t0).is_allowed());
        assert_eq!(rl.len(), 3);
    }

    #[test]
    fn sixth_login_rejected_only_for_same_username() {
        let rl = RateLimiter::new();
        for _ in 0..5 {
            assert!(rl.check("alice@example.com", "login", LOGIN).is_allowed());
        }
        assert!(!rl.check("alice@example.com", "login", LOGIN).is_allowed());
        assert!(rl.check("bob@example.com", "login", LOGIN).is_allowed());
    }

    #[test]
    fn zero_limit_rejects_everything() {
        let rl = RateLimiter::new();
        match rl.check("a", "x", Quota::new(0, 30)) {
            CheckResult::RateLimited { retry_after } => assert_eq!(retry_after, secs(30)),
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[test]
    fn concurrent_callers_never_exceed_limit() {
        let rl = Arc::new(RateLimiter::new());
        let quota = Quota::new(10, 60);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let rl = rl.clone();
                std::thread::spawn(move || {
                    (0..25)
                        .filter(|_| rl.check("shared", "send_message", quota).is_allowed())
                        .count()
                })
            })
            .collect();
        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 10);
    }

    #[test]
    fn huge_window_reports_retry_without_overflow() {
        let rl = RateLimiter::new();
        let quota = Quota::new(1, u64::MAX);
        assert!(rl.check("a", "x", quota).is_allowed());
        match rl.check("a", "x", quota) {
            CheckResult::RateLimited { retry_after } => assert_eq!(retry_after, quota.window()),
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[test]
    fn zero_limit_does_not_track_keys() {
        let rl = RateLimiter::new();
        for i in 0..10 {
            let email = format!("user{i}@example.com");
            assert!(!rl.check(&email, "login", Quota::new(0, 60)).is_allowed());
        }
        assert!(rl.is_empty());
    }

    #[test]
    fn cleanup_drops_idle_keys_only() {
        let rl = RateLimiter::new();
        let t0 = Instant::now();
        assert!(rl.check_at("old", "login", LOGIN, t0).is_allowed());
        assert!(rl.check_at("fresh", "login", LOGIN, t0 + secs(100)).is_allowed());

        assert_eq!(rl.cleanup_at(secs(60), t0 + secs(120)), 1);
        assert_eq!(rl.len(), 1);
        // The surviving key keeps its window.
        for _ in 0..4 {
            assert!(rl.check_at("fresh", "login", LOGIN, t0 + secs(120)).is_allowed());
        }
        assert!(!rl.check_at("fresh", "login", LOGIN, t0 + secs(120)).is_allowed());
    }

    #[test]
    fn quota_window_converts_seconds() {
        assert_eq!(Quota::new(3, 90).window(), secs(90));
    }
}
