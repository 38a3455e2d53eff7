//! Circuit breaker for outbound provider calls, keyed by provider name.
//!
//! Prevents cascading failure when a provider degrades. After N consecutive
//! failures, the provider's circuit opens and calls are skipped until the
//! recovery time expires. There is no half-open trial state: once recovery
//! time elapses the next call is treated as closed, and a failure there
//! restarts the streak from 1.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Breaker state for one provider.
#[derive(Debug, Clone, Copy)]
struct BreakerSlot {
    /// Consecutive failures recorded within the streak window
    failure_count: u32,
    /// When the failure streak decays back to zero
    streak_expires_at: Instant,
    /// Set while the circuit is open
    opened_until: Option<Instant>,
}

/// Per-provider circuit breaker with a binary open/closed state machine.
///
/// CLOSED transitions to OPEN on reaching the failure threshold; OPEN
/// transitions back to CLOSED only through passive expiry of the recovery
/// time. A single recorded success fully resets the provider's state.
pub struct CircuitBreaker {
    failure_threshold: u32,
    recovery_time: Duration,
    slots: Mutex<HashMap<String, BreakerSlot>>,
}

impl CircuitBreaker {
    /// Creates a breaker opening after `failure_threshold` consecutive
    /// failures and staying open for `recovery_time`.
    pub fn new(failure_threshold: u32, recovery_time: Duration) -> Self {
        CircuitBreaker {
            failure_threshold,
            recovery_time,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Records a failed call for `provider`.
    ///
    /// Returns `true` when this failure crossed the threshold and opened the
    /// circuit, so the caller can emit its notification exactly once. The
    /// failure streak itself expires after the recovery time, so isolated
    /// failures hours apart never accumulate.
    pub async fn record_failure(&self, provider: &str) -> bool {
        let mut slots = self.slots.lock().await;
        let now = Instant::now();

        let slot = slots.entry(provider.to_string()).or_insert(BreakerSlot {
            failure_count: 0,
            streak_expires_at: now + self.recovery_time,
            opened_until: None,
        });

        if now >= slot.streak_expires_at {
            slot.failure_count = 0;
        }
        slot.failure_count += 1;
        slot.streak_expires_at = now + self.recovery_time;

        if slot.failure_count >= self.failure_threshold && slot.opened_until.is_none() {
            slot.opened_until = Some(now + self.recovery_time);
            slot.failure_count = 0;
            return true;
        }
        false
    }

    /// Records a successful call for `provider`, fully resetting its state:
    /// the failure streak drops to zero and any open circuit closes.
    pub async fn record_success(&self, provider: &str) {
        let mut slots = self.slots.lock().await;
        slots.remove(provider);
    }

    /// Checks whether `provider`'s circuit is currently open.
    ///
    /// Returns `false` once the recovery time has expired, which also clears
    /// the open marker so the next failure starts a fresh streak.
    pub async fn is_open(&self, provider: &str) -> bool {
        let mut slots = self.slots.lock().await;
        let now = Instant::now();

        let Some(slot) = slots.get_mut(provider) else {
            return false;
        };
        match slot.opened_until {
            Some(until) if now >= until => {
                slot.opened_until = None;
                slot.failure_count = 0;
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Current failure streak for `provider` (for health reporting).
    pub async fn failure_count(&self, provider: &str) -> u32 {
        let slots = self.slots.lock().await;
        match slots.get(provider) {
            Some(slot) if Instant::now() < slot.streak_expires_at => slot.failure_count,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_opens_after_threshold() {
        let cb = CircuitBreaker::new(3, Duration::from_secs(60));

        assert!(!cb.record_failure("google").await);
        assert!(!cb.record_failure("google").await);
        assert!(!cb.is_open("google").await);
        assert_eq!(cb.failure_count("google").await, 2);

        // Third failure crosses the threshold exactly once
        assert!(cb.record_failure("google").await);
        assert!(cb.is_open("google").await);
    }

    #[tokio::test]
    async fn test_success_resets_streak_and_closes() {
        let cb = CircuitBreaker::new(3, Duration::from_secs(60));

        cb.record_failure("google").await;
        cb.record_failure("google").await;
        cb.record_success("google").await;
        assert_eq!(cb.failure_count("google").await, 0);

        // Streak restarts from scratch after the reset
        assert!(!cb.record_failure("google").await);
        assert!(!cb.record_failure("google").await);
        assert!(cb.record_failure("google").await);
        assert!(cb.is_open("google").await);

        cb.record_success("google").await;
        assert!(!cb.is_open("google").await);
    }

    #[tokio::test]
    async fn test_recovery_time_reopens_passively() {
        let cb = CircuitBreaker::new(2, Duration::from_millis(50));

        cb.record_failure("google").await;
        cb.record_failure("google").await;
        assert!(cb.is_open("google").await);

        sleep(Duration::from_millis(60)).await;

        // No explicit half-open state: the circuit is simply closed again
        assert!(!cb.is_open("google").await);
        // A failure after expiry restarts the streak from 1
        assert!(!cb.record_failure("google").await);
        assert_eq!(cb.failure_count("google").await, 1);
    }

    #[tokio::test]
    async fn test_failure_streak_decays() {
        let cb = CircuitBreaker::new(2, Duration::from_millis(50));

        cb.record_failure("google").await;
        sleep(Duration::from_millis(60)).await;

        // The earlier failure expired with its TTL, so this one is a fresh
        // streak of 1 and does not open the circuit
        assert!(!cb.record_failure("google").await);
        assert!(!cb.is_open("google").await);
    }

    #[tokio::test]
    async fn test_providers_do_not_share_state() {
        let cb = CircuitBreaker::new(2, Duration::from_secs(60));

        cb.record_failure("google").await;
        cb.record_failure("google").await;
        assert!(cb.is_open("google").await);
        assert!(!cb.is_open("usps").await);
        assert_eq!(cb.failure_count("usps").await, 0);
    }

    #[tokio::test]
    async fn test_unknown_provider_is_closed() {
        let cb = CircuitBreaker::new(2, Duration::from_secs(60));
        assert!(!cb.is_open("never-seen").await);
        assert_eq!(cb.failure_count("never-seen").await, 0);
    }
}
