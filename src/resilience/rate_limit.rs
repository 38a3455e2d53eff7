//! Fixed-window rate limiting, keyed by provider name.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Counter state for one provider within the current window.
#[derive(Debug, Clone, Copy)]
struct WindowSlot {
    count: u32,
    window_started_at: Instant,
}

/// Thread-safe fixed-window rate limiter.
///
/// Each provider key gets an independent counter. The counter resets
/// automatically once its window elapses; there is no manual reset.
pub struct FixedWindowRateLimiter {
    limit: u32,
    window: Duration,
    slots: Mutex<HashMap<String, WindowSlot>>,
}

impl FixedWindowRateLimiter {
    /// Creates a limiter allowing `limit` requests per `window` per provider.
    pub fn new(limit: u32, window: Duration) -> Self {
        FixedWindowRateLimiter {
            limit,
            window,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Counts one request against `provider`'s current window.
    ///
    /// Returns `false` once the limit is reached within the window; the
    /// request being checked must then not be made.
    pub async fn check(&self, provider: &str) -> bool {
        let mut slots = self.slots.lock().await;
        let now = Instant::now();

        let slot = slots.entry(provider.to_string()).or_insert(WindowSlot {
            count: 0,
            window_started_at: now,
        });

        if now.duration_since(slot.window_started_at) >= self.window {
            slot.count = 0;
            slot.window_started_at = now;
        }

        if slot.count >= self.limit {
            return false;
        }

        slot.count += 1;
        true
    }

    /// Requests counted against `provider` in its current window.
    pub async fn used(&self, provider: &str) -> u32 {
        let slots = self.slots.lock().await;
        match slots.get(provider) {
            Some(slot) if Instant::now().duration_since(slot.window_started_at) < self.window => {
                slot.count
            }
            _ => 0,
        }
    }

    /// The configured per-window limit.
    pub fn limit(&self) -> u32 {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_allows_up_to_limit() {
        let limiter = FixedWindowRateLimiter::new(3, Duration::from_secs(60));

        assert!(limiter.check("google").await);
        assert!(limiter.check("google").await);
        assert!(limiter.check("google").await);
        assert!(!limiter.check("google").await);
        assert_eq!(limiter.used("google").await, 3);
    }

    #[tokio::test]
    async fn test_providers_do_not_share_counters() {
        let limiter = FixedWindowRateLimiter::new(1, Duration::from_secs(60));

        assert!(limiter.check("google").await);
        assert!(!limiter.check("google").await);
        // A different provider key still has a fresh window
        assert!(limiter.check("usps").await);
        assert_eq!(limiter.used("google").await, 1);
        assert_eq!(limiter.used("usps").await, 1);
    }

    #[tokio::test]
    async fn test_window_resets_after_elapse() {
        let limiter = FixedWindowRateLimiter::new(2, Duration::from_millis(50));

        assert!(limiter.check("google").await);
        assert!(limiter.check("google").await);
        assert!(!limiter.check("google").await);

        sleep(Duration::from_millis(60)).await;

        assert!(limiter.check("google").await);
        assert_eq!(limiter.used("google").await, 1);
    }

    #[tokio::test]
    async fn test_used_reports_zero_for_expired_window() {
        let limiter = FixedWindowRateLimiter::new(5, Duration::from_millis(50));
        assert!(limiter.check("google").await);
        assert_eq!(limiter.used("google").await, 1);

        sleep(Duration::from_millis(60)).await;
        assert_eq!(limiter.used("google").await, 0);
    }

    #[tokio::test]
    async fn test_used_unknown_provider() {
        let limiter = FixedWindowRateLimiter::new(5, Duration::from_secs(60));
        assert_eq!(limiter.used("never-seen").await, 0);
    }
}
