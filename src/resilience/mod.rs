//! Outbound-call protection: rate limiting and circuit breaking.
//!
//! This module provides:
//! - A fixed-window rate limiter keyed by provider name
//! - A per-provider circuit breaker (binary open/closed, passive recovery)
//! - `ResilienceGuard`, the wrapper applied around every outbound provider
//!   call: open circuit or exhausted window short-circuits to a fallback,
//!   failures feed the breaker, successes reset it
//!
//! The guard is reusable across arbitrarily many named providers; counters
//! for different keys never contaminate one another.

mod circuit_breaker;
mod observer;
mod rate_limit;

pub use circuit_breaker::CircuitBreaker;
pub use observer::{LogObserver, ResilienceObserver};
pub use rate_limit::FixedWindowRateLimiter;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::config::{
    CIRCUIT_FAILURE_THRESHOLD, CIRCUIT_RECOVERY_SECS, RATE_LIMIT_REQUESTS, RATE_LIMIT_WINDOW_SECS,
};
use crate::error_handling::ProviderError;

/// Tunables for the guard, populated from `Config` by the composition root.
#[derive(Debug, Clone, Copy)]
pub struct ResilienceSettings {
    /// Maximum requests per provider per window
    pub rate_limit_requests: u32,
    /// Fixed rate-limit window length
    pub rate_limit_window: Duration,
    /// Consecutive failures before a circuit opens
    pub failure_threshold: u32,
    /// How long an open circuit stays open
    pub recovery_time: Duration,
}

impl Default for ResilienceSettings {
    fn default() -> Self {
        ResilienceSettings {
            rate_limit_requests: RATE_LIMIT_REQUESTS,
            rate_limit_window: Duration::from_secs(RATE_LIMIT_WINDOW_SECS),
            failure_threshold: CIRCUIT_FAILURE_THRESHOLD,
            recovery_time: Duration::from_secs(CIRCUIT_RECOVERY_SECS),
        }
    }
}

/// Point-in-time health of one guarded provider key.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderHealth {
    /// False when the circuit is open
    pub healthy: bool,
    /// "open" or "closed"
    pub circuit_state: String,
    /// Current consecutive-failure streak
    pub failure_count: u32,
    /// Requests counted in the current rate-limit window
    pub rate_limit_used: u32,
    /// Requests allowed per window
    pub rate_limit_max: u32,
}

/// Rate limiter + circuit breaker wrapper for outbound provider calls.
pub struct ResilienceGuard {
    settings: ResilienceSettings,
    rate_limiter: FixedWindowRateLimiter,
    circuit_breaker: CircuitBreaker,
    observer: Arc<dyn ResilienceObserver>,
}

impl ResilienceGuard {
    /// Creates a guard with the given settings and event observer.
    pub fn new(settings: ResilienceSettings, observer: Arc<dyn ResilienceObserver>) -> Self {
        ResilienceGuard {
            rate_limiter: FixedWindowRateLimiter::new(
                settings.rate_limit_requests,
                settings.rate_limit_window,
            ),
            circuit_breaker: CircuitBreaker::new(settings.failure_threshold, settings.recovery_time),
            settings,
            observer,
        }
    }

    /// Counts one request against `provider`'s window; false once exhausted.
    pub async fn check_rate_limit(&self, provider: &str) -> bool {
        self.rate_limiter.check(provider).await
    }

    /// True while `provider`'s circuit is open.
    pub async fn is_circuit_open(&self, provider: &str) -> bool {
        self.circuit_breaker.is_open(provider).await
    }

    /// Records a failed call and notifies the observer; opening the circuit
    /// emits its notification exactly once.
    pub async fn record_failure(&self, provider: &str, error: &ProviderError) {
        self.observer.on_provider_error(provider, error);
        if self.circuit_breaker.record_failure(provider).await {
            self.observer
                .on_circuit_opened(provider, self.settings.recovery_time);
        }
    }

    /// Records a successful call: failure streak cleared, circuit closed.
    pub async fn record_success(&self, provider: &str) {
        self.circuit_breaker.record_success(provider).await;
    }

    /// Runs `call` under rate-limit and circuit protection.
    ///
    /// Open circuit or exhausted window returns `fallback` without invoking
    /// `call`. An `Err` outcome is recorded as a failure and `fallback` is
    /// returned; an `Ok` outcome is recorded as a success and returned
    /// verbatim. Nothing propagates to the caller as an error.
    pub async fn guarded_call<T, F, Fut>(&self, provider: &str, call: F, fallback: T) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        if self.is_circuit_open(provider).await {
            self.observer.on_call_skipped(provider);
            return fallback;
        }
        if !self.check_rate_limit(provider).await {
            self.observer.on_rate_limit_exceeded(
                provider,
                self.settings.rate_limit_requests,
                self.settings.rate_limit_window,
            );
            return fallback;
        }

        match call().await {
            Ok(value) => {
                self.record_success(provider).await;
                value
            }
            Err(error) => {
                self.record_failure(provider, &error).await;
                fallback
            }
        }
    }

    /// Point-in-time health snapshot for one provider key.
    pub async fn provider_health(&self, provider: &str) -> ProviderHealth {
        let open = self.circuit_breaker.is_open(provider).await;
        ProviderHealth {
            healthy: !open,
            circuit_state: if open { "open" } else { "closed" }.to_string(),
            failure_count: self.circuit_breaker.failure_count(provider).await,
            rate_limit_used: self.rate_limiter.used(provider).await,
            rate_limit_max: self.rate_limiter.limit(),
        }
    }
}
