//! Resilience event observation.
//!
//! The guard reports rate-limit and circuit events through an injected
//! observer rather than a global event bus, keeping the core testable. The
//! default observer writes structured log lines.

use std::time::Duration;

use crate::error_handling::ProviderError;

/// Receives fire-and-forget notifications from the resilience guard.
///
/// Implementations must not block for long; the guard calls these inline on
/// the request path.
pub trait ResilienceObserver: Send + Sync {
    /// A provider call failed with a transport or upstream error.
    fn on_provider_error(&self, provider: &str, error: &ProviderError);

    /// A call was rejected because the provider's window is exhausted.
    fn on_rate_limit_exceeded(&self, provider: &str, limit: u32, window: Duration);

    /// A failure streak crossed the threshold and opened the circuit.
    fn on_circuit_opened(&self, provider: &str, recovery_time: Duration);

    /// A call was skipped because the provider's circuit is open.
    fn on_call_skipped(&self, provider: &str);
}

/// Default observer: structured log lines at the levels the events warrant.
pub struct LogObserver;

impl ResilienceObserver for LogObserver {
    fn on_provider_error(&self, provider: &str, error: &ProviderError) {
        log::error!("Provider call failed for {}: {}", provider, error);
    }

    fn on_rate_limit_exceeded(&self, provider: &str, limit: u32, window: Duration) {
        log::warn!(
            "Rate limit exceeded for {}: {} requests / {}s window",
            provider,
            limit,
            window.as_secs()
        );
    }

    fn on_circuit_opened(&self, provider: &str, recovery_time: Duration) {
        log::error!(
            "Circuit opened for {} after repeated failures (recovery: {}s)",
            provider,
            recovery_time.as_secs()
        );
    }

    fn on_call_skipped(&self, provider: &str) {
        log::info!("Skipping call to {}: circuit is open", provider);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts events so tests can assert on notification behavior.
    #[derive(Default)]
    pub struct CountingObserver {
        pub errors: AtomicUsize,
        pub rate_limited: AtomicUsize,
        pub circuits_opened: AtomicUsize,
        pub skipped: AtomicUsize,
    }

    impl ResilienceObserver for CountingObserver {
        fn on_provider_error(&self, _provider: &str, _error: &ProviderError) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_rate_limit_exceeded(&self, _provider: &str, _limit: u32, _window: Duration) {
            self.rate_limited.fetch_add(1, Ordering::SeqCst);
        }

        fn on_circuit_opened(&self, _provider: &str, _recovery_time: Duration) {
            self.circuits_opened.fetch_add(1, Ordering::SeqCst);
        }

        fn on_call_skipped(&self, _provider: &str) {
            self.skipped.fetch_add(1, Ordering::SeqCst);
        }
    }
}
