//! Address validation orchestration.
//!
//! `AddressValidationService` composes the provider adapter, the result
//! cache, and the resilience guard. Policy decisions live here:
//! - Cache-first: a hit short-circuits the provider and all guard bookkeeping
//! - Fail open: no provider, disabled validation, or a guarded failure all
//!   yield a usable result rather than an error, so enrollment is never
//!   blocked by a third-party outage
//! - Guarded fallbacks are NOT cached; only genuine provider outcomes are,
//!   so a recovered provider is consulted again immediately

use std::sync::Arc;
use std::time::Duration;

use crate::address::{Address, Prediction, ValidationResult};
use crate::cache::{ResultCache, TtlStore};
use crate::config::{AUTOCOMPLETE_MIN_INPUT_CHARS, VALIDATION_CACHE_TTL_SECS};
use crate::providers::{AddressProvider, ISSUE_NOT_PERFORMED};
use crate::resilience::{ProviderHealth, ResilienceGuard};

/// Behavior switches for the validation service.
#[derive(Debug, Clone, Copy)]
pub struct ValidationOptions {
    /// Provider-backed autocomplete on/off
    pub autocomplete_enabled: bool,
    /// Provider-backed validation on/off (off means every address passes)
    pub validation_enabled: bool,
    /// A provider was selected but its credentials are missing; results
    /// carry an issue noting validation was not performed, instead of the
    /// silent pass-through of the deliberate no-provider setup
    pub provider_misconfigured: bool,
    /// TTL for cached validation outcomes
    pub cache_ttl: Duration,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        ValidationOptions {
            autocomplete_enabled: true,
            validation_enabled: true,
            provider_misconfigured: false,
            cache_ttl: Duration::from_secs(VALIDATION_CACHE_TTL_SECS),
        }
    }
}

/// Validates and standardizes postal addresses through the configured
/// provider, with caching and resilience around every outbound call.
pub struct AddressValidationService {
    provider: Option<Arc<dyn AddressProvider>>,
    guard: Arc<ResilienceGuard>,
    cache: ResultCache,
    options: ValidationOptions,
}

impl AddressValidationService {
    /// Creates the service. `provider = None` selects the permissive
    /// pass-through behavior for every operation.
    pub fn new(
        provider: Option<Arc<dyn AddressProvider>>,
        guard: Arc<ResilienceGuard>,
        store: Arc<dyn TtlStore>,
        options: ValidationOptions,
    ) -> Self {
        AddressValidationService {
            provider,
            guard,
            cache: ResultCache::new("validate", options.cache_ttl, store),
            options,
        }
    }

    fn guard_key(&self, concern: &str) -> Option<String> {
        self.provider
            .as_ref()
            .map(|p| format!("{}:{}", p.name(), concern))
    }

    /// Autocomplete predictions for a partial input.
    ///
    /// Returns empty immediately for inputs shorter than three characters,
    /// when autocomplete is disabled, or when no provider is configured.
    pub async fn get_autocomplete_predictions(
        &self,
        input: &str,
        session_token: Option<&str>,
    ) -> Vec<Prediction> {
        let input = input.trim();
        if input.chars().count() < AUTOCOMPLETE_MIN_INPUT_CHARS || !self.options.autocomplete_enabled
        {
            return Vec::new();
        }
        let Some(provider) = self.provider.as_ref() else {
            return Vec::new();
        };
        let key = format!("{}:autocomplete", provider.name());

        self.guard
            .guarded_call(
                &key,
                || provider.autocomplete(input, session_token),
                Vec::new(),
            )
            .await
    }

    /// Validates one address.
    ///
    /// Cache-first; otherwise dispatches to the provider under the guard and
    /// caches the outcome. Every failure mode degrades to a valid result
    /// carrying an explanatory issue.
    pub async fn validate_address(&self, address: &Address) -> ValidationResult {
        let key = self.cache.key(&address.key_parts());
        if let Some(cached) = self.cache.get::<ValidationResult>(&key) {
            log::debug!("Validation cache hit for {}", address.single_line());
            return cached;
        }

        let (Some(provider), true) = (self.provider.as_ref(), self.options.validation_enabled)
        else {
            return if self.options.provider_misconfigured {
                ValidationResult::unverified(address, ISSUE_NOT_PERFORMED)
            } else {
                ValidationResult::passthrough(address)
            };
        };
        let guard_key = format!("{}:validation", provider.name());

        let outcome = self
            .guard
            .guarded_call(
                &guard_key,
                || async { provider.validate(address).await.map(Some) },
                None,
            )
            .await;

        match outcome {
            Some(result) => {
                self.cache.set(&key, &result);
                result
            }
            // Circuit open, rate limited, or the call failed: fail open,
            // uncached so recovery is picked up on the next request
            None => ValidationResult::unverified(address, ISSUE_NOT_PERFORMED),
        }
    }

    /// Resolves an autocomplete place id into a full address. Providers
    /// without a place-detail concept resolve to `None`.
    pub async fn get_place_details(
        &self,
        place_id: &str,
        session_token: Option<&str>,
    ) -> Option<Address> {
        let provider = self.provider.as_ref()?;
        let key = format!("{}:details", provider.name());

        self.guard
            .guarded_call(
                &key,
                || provider.place_details(place_id, session_token),
                None,
            )
            .await
    }

    /// Cached validation outcome for an address, without triggering any
    /// provider call. Used by geocoding to reuse coordinates the validator
    /// already learned.
    pub fn cached_result(&self, address: &Address) -> Option<ValidationResult> {
        let key = self.cache.key(&address.key_parts());
        self.cache.get(&key)
    }

    /// Guard keys this service calls providers under, for health reporting.
    pub fn provider_keys(&self) -> Vec<String> {
        ["validation", "autocomplete", "details"]
            .iter()
            .filter_map(|concern| self.guard_key(concern))
            .collect()
    }

    /// Health snapshots for this service's guard keys.
    pub async fn health(&self) -> Vec<(String, ProviderHealth)> {
        let mut report = Vec::new();
        for key in self.provider_keys() {
            let health = self.guard.provider_health(&key).await;
            report.push((key, health));
        }
        report
    }
}
