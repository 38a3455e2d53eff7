//! Geocoding and the combined service-address verdict.
//!
//! `GeocodingService` turns addresses into coordinates (reusing coordinates
//! the validator already learned when it can), owns the territory engine,
//! and composes validation + geocoding + territory checking into the single
//! verdict the enrollment flow consumes. It also aggregates per-provider
//! health for operational visibility.
//!
//! Territory-unknown is deliberately distinct from territory-denied: a
//! failed geocode yields `in_territory: None` with an explanatory message,
//! never a denial.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::address::{Address, Coordinates, GeocodeResult};
use crate::cache::{ResultCache, TtlStore};
use crate::config::{GEOCODE_CACHE_TTL_SECS, REVERSE_GEOCODE_CACHE_TTL_SECS};
use crate::providers::AddressProvider;
use crate::resilience::{ProviderHealth, ResilienceGuard};
use crate::territory::{TerritoryEngine, TerritoryMatch, ZipResolver};
use crate::validation::AddressValidationService;

/// Verdict message when geocoding failed and territory is unknown.
pub const MSG_TERRITORY_UNKNOWN: &str = "Unable to verify service territory.";
/// Verdict message for an address inside the territory.
pub const MSG_IN_TERRITORY: &str = "Address is in the service territory.";
/// Verdict message for an address outside the territory.
pub const MSG_OUT_OF_TERRITORY: &str = "Address is outside the service territory.";
/// Verdict message when strict validation rejected the address outright.
pub const MSG_INVALID_ADDRESS: &str = "Address could not be validated.";

/// Behavior switches for the geocoding service.
#[derive(Debug, Clone, Copy)]
pub struct GeocodingOptions {
    /// TTL for cached geocoding results
    pub cache_ttl: Duration,
    /// Treat a failed validation as out-of-territory instead of geocoding
    /// the submitted address anyway
    pub strict_validation: bool,
}

impl Default for GeocodingOptions {
    fn default() -> Self {
        GeocodingOptions {
            cache_ttl: Duration::from_secs(GEOCODE_CACHE_TTL_SECS),
            strict_validation: false,
        }
    }
}

/// Combined outcome of validate + geocode + territory check.
///
/// `in_territory` is three-valued: confirmed in, confirmed out, or `None`
/// when the territory could not be determined.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceAddressVerdict {
    /// Whether validation confirmed the address
    pub valid: bool,
    /// Territory decision, absent when it could not be made
    pub in_territory: Option<bool>,
    /// Human-readable explanation of the outcome
    pub message: String,
    /// Standardized address from validation
    pub standardized: Address,
    /// Coordinates used for the territory check, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    /// Territories the point fell inside
    pub matching_territories: Vec<TerritoryMatch>,
}

/// Per-provider health aggregated across validation and geocoding keys.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Guard key → health snapshot
    pub providers: BTreeMap<String, ProviderHealth>,
}

/// Reverse-geocodes points to ZIP codes through the provider, cached for
/// 30 days and guarded under the provider's geocoding key.
struct ProviderZipResolver {
    provider: Arc<dyn AddressProvider>,
    guard: Arc<ResilienceGuard>,
    cache: ResultCache,
}

impl ProviderZipResolver {
    fn new(
        provider: Arc<dyn AddressProvider>,
        guard: Arc<ResilienceGuard>,
        store: Arc<dyn TtlStore>,
    ) -> Self {
        ProviderZipResolver {
            provider,
            guard,
            cache: ResultCache::new(
                "reverse_geocode",
                Duration::from_secs(REVERSE_GEOCODE_CACHE_TTL_SECS),
                store,
            ),
        }
    }
}

#[async_trait]
impl ZipResolver for ProviderZipResolver {
    async fn resolve_zip(&self, latitude: f64, longitude: f64) -> Option<String> {
        let point = format!("{:.6},{:.6}", latitude, longitude);
        let key = self.cache.key(&[&point]);
        if let Some(zip) = self.cache.get::<String>(&key) {
            return Some(zip);
        }

        let guard_key = format!("{}:geocoding", self.provider.name());
        let zip = self
            .guard
            .guarded_call(
                &guard_key,
                || self.provider.reverse_geocode_zip(latitude, longitude),
                None,
            )
            .await?;
        self.cache.set(&key, &zip);
        Some(zip)
    }
}

/// Geocodes addresses and renders the combined service-address verdict.
pub struct GeocodingService {
    provider: Option<Arc<dyn AddressProvider>>,
    guard: Arc<ResilienceGuard>,
    validation: Arc<AddressValidationService>,
    territory: TerritoryEngine,
    cache: ResultCache,
    strict_validation: bool,
}

impl GeocodingService {
    /// Creates the service and its embedded territory engine. The engine
    /// gets a ZIP resolver only when a provider is configured.
    pub fn new(
        provider: Option<Arc<dyn AddressProvider>>,
        guard: Arc<ResilienceGuard>,
        validation: Arc<AddressValidationService>,
        store: Arc<dyn TtlStore>,
        options: GeocodingOptions,
    ) -> Self {
        let zip_resolver = provider.as_ref().map(|p| {
            Arc::new(ProviderZipResolver::new(
                Arc::clone(p),
                Arc::clone(&guard),
                Arc::clone(&store),
            )) as Arc<dyn ZipResolver>
        });
        let territory = TerritoryEngine::new(Arc::clone(&store), zip_resolver);

        GeocodingService {
            provider,
            guard,
            validation,
            territory,
            cache: ResultCache::new("geocode", options.cache_ttl, store),
            strict_validation: options.strict_validation,
        }
    }

    /// The embedded territory engine (territory CRUD and checks).
    pub fn territories(&self) -> &TerritoryEngine {
        &self.territory
    }

    /// Geocodes one address. Returns `None` on empty input, no provider,
    /// zero results, or any guarded failure; never an error.
    ///
    /// Coordinates already present in a cached validation result for this
    /// address are reused without a provider call.
    pub async fn geocode_address(&self, address: &Address) -> Option<GeocodeResult> {
        if address.is_empty() {
            return None;
        }

        if let Some(validated) = self.validation.cached_result(address) {
            if let Some(coordinates) = validated.coordinates {
                log::debug!(
                    "Reusing validator coordinates for {}",
                    address.single_line()
                );
                return Some(GeocodeResult {
                    latitude: coordinates.latitude,
                    longitude: coordinates.longitude,
                    formatted_address: Some(validated.standardized.single_line()),
                });
            }
        }

        let key = self.cache.key(&address.key_parts());
        if let Some(cached) = self.cache.get::<GeocodeResult>(&key) {
            return Some(cached);
        }

        let provider = self.provider.as_ref()?;
        let guard_key = format!("{}:geocoding", provider.name());
        let outcome = self
            .guard
            .guarded_call(&guard_key, || provider.geocode(address), None)
            .await;

        if let Some(result) = &outcome {
            self.cache.set(&key, result);
        }
        outcome
    }

    /// Validates the address, geocodes it, and classifies the point against
    /// the configured territories for `utility`.
    pub async fn validate_service_address(
        &self,
        address: &Address,
        utility: Option<&str>,
    ) -> ServiceAddressVerdict {
        let validation = self.validation.validate_address(address).await;

        if !validation.valid && self.strict_validation {
            return ServiceAddressVerdict {
                valid: false,
                in_territory: Some(false),
                message: MSG_INVALID_ADDRESS.to_string(),
                standardized: validation.standardized,
                coordinates: None,
                matching_territories: Vec::new(),
            };
        }

        let coordinates = match validation.coordinates {
            Some(coordinates) => Some(coordinates),
            None => self
                .geocode_address(&validation.standardized)
                .await
                .map(|g| g.coordinates()),
        };

        let Some(coordinates) = coordinates else {
            // Unknown territory is not a denial
            return ServiceAddressVerdict {
                valid: validation.valid,
                in_territory: None,
                message: MSG_TERRITORY_UNKNOWN.to_string(),
                standardized: validation.standardized,
                coordinates: None,
                matching_territories: Vec::new(),
            };
        };

        let verdict = self
            .territory
            .check_service_territory(coordinates.latitude, coordinates.longitude, utility)
            .await;

        ServiceAddressVerdict {
            valid: validation.valid,
            in_territory: Some(verdict.in_territory),
            message: if verdict.in_territory {
                MSG_IN_TERRITORY.to_string()
            } else {
                MSG_OUT_OF_TERRITORY.to_string()
            },
            standardized: validation.standardized,
            coordinates: Some(coordinates),
            matching_territories: verdict.matching_territories,
        }
    }

    /// Per-provider health across this service's geocoding key and the
    /// nested validation service's keys.
    pub async fn get_health_status(&self) -> HealthStatus {
        let mut providers = BTreeMap::new();
        if let Some(provider) = self.provider.as_ref() {
            let key = format!("{}:geocoding", provider.name());
            let health = self.guard.provider_health(&key).await;
            providers.insert(key, health);
        }
        for (key, health) in self.validation.health().await {
            providers.insert(key, health);
        }
        HealthStatus { providers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryTtlStore;
    use crate::providers::test_support::MockProvider;
    use crate::resilience::{LogObserver, ResilienceSettings};
    use crate::territory::{TerritoryDraft, TerritoryRule};
    use crate::validation::ValidationOptions;
    use std::sync::atomic::Ordering;

    fn white_house() -> Address {
        Address {
            street: "1600 Pennsylvania Ave".to_string(),
            city: "Washington".to_string(),
            state: "DC".to_string(),
            zip: "20500".to_string(),
            ..Default::default()
        }
    }

    fn dc_geocode() -> GeocodeResult {
        GeocodeResult {
            latitude: 38.90,
            longitude: -77.02,
            formatted_address: Some("1600 Pennsylvania Ave NW, Washington, DC 20500".to_string()),
        }
    }

    struct Harness {
        geocoding: GeocodingService,
        validation: Arc<AddressValidationService>,
        mock: Option<Arc<MockProvider>>,
    }

    fn harness(provider: Option<Arc<MockProvider>>, strict: bool) -> Harness {
        let store: Arc<dyn TtlStore> = Arc::new(MemoryTtlStore::new());
        // Start from an empty territory collection so tests control it fully
        store.set("territories", "[]", None);
        let guard = Arc::new(ResilienceGuard::new(
            ResilienceSettings::default(),
            Arc::new(LogObserver),
        ));
        let dyn_provider = provider
            .as_ref()
            .map(|p| Arc::clone(p) as Arc<dyn AddressProvider>);
        let validation = Arc::new(AddressValidationService::new(
            dyn_provider.clone(),
            Arc::clone(&guard),
            Arc::clone(&store),
            ValidationOptions::default(),
        ));
        let geocoding = GeocodingService::new(
            dyn_provider,
            guard,
            Arc::clone(&validation),
            store,
            GeocodingOptions {
                strict_validation: strict,
                ..Default::default()
            },
        );
        Harness {
            geocoding,
            validation,
            mock: provider,
        }
    }

    async fn add_dc_territory(service: &GeocodingService) -> String {
        service
            .territories()
            .save_territory(TerritoryDraft {
                id: None,
                name: "Pepco DC".to_string(),
                utility: "pepco".to_string(),
                rule: TerritoryRule::State {
                    states: vec!["DC".to_string()],
                },
            })
            .await
    }

    #[tokio::test]
    async fn test_no_provider_yields_unknown_territory() {
        let h = harness(None, false);
        add_dc_territory(&h.geocoding).await;

        let verdict = h
            .geocoding
            .validate_service_address(&white_house(), Some("pepco"))
            .await;
        assert!(verdict.valid);
        assert_eq!(verdict.in_territory, None);
        assert_eq!(verdict.message, MSG_TERRITORY_UNKNOWN);
        assert!(verdict.matching_territories.is_empty());
    }

    #[tokio::test]
    async fn test_geocoded_point_matches_state_territory() {
        let mock = Arc::new(MockProvider::default());
        *mock.geocode_response.lock().unwrap() = Some(Ok(Some(dc_geocode())));
        let h = harness(Some(mock), false);
        let territory_id = add_dc_territory(&h.geocoding).await;

        let verdict = h
            .geocoding
            .validate_service_address(&white_house(), Some("pepco"))
            .await;
        assert!(verdict.valid);
        assert_eq!(verdict.in_territory, Some(true));
        assert_eq!(verdict.message, MSG_IN_TERRITORY);
        assert!(verdict
            .matching_territories
            .iter()
            .any(|m| m.id == territory_id));
        let coords = verdict.coordinates.expect("coordinates");
        assert!((coords.latitude - 38.90).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_out_of_territory_point() {
        let mock = Arc::new(MockProvider::default());
        *mock.geocode_response.lock().unwrap() = Some(Ok(Some(GeocodeResult {
            latitude: 39.9526,
            longitude: -75.1652, // Philadelphia
            formatted_address: None,
        })));
        let h = harness(Some(mock), false);
        add_dc_territory(&h.geocoding).await;

        let verdict = h
            .geocoding
            .validate_service_address(&white_house(), Some("pepco"))
            .await;
        assert_eq!(verdict.in_territory, Some(false));
        assert_eq!(verdict.message, MSG_OUT_OF_TERRITORY);
    }

    #[tokio::test]
    async fn test_strict_mode_short_circuits_invalid_address() {
        let mock = Arc::new(MockProvider::default());
        let mut invalid = crate::address::ValidationResult::passthrough(&white_house());
        invalid.valid = false;
        *mock.validate_response.lock().unwrap() = Some(Ok(invalid));
        let h = harness(Some(Arc::clone(&mock)), true);
        add_dc_territory(&h.geocoding).await;

        let verdict = h
            .geocoding
            .validate_service_address(&white_house(), Some("pepco"))
            .await;
        assert!(!verdict.valid);
        assert_eq!(verdict.in_territory, Some(false));
        assert_eq!(verdict.message, MSG_INVALID_ADDRESS);
        // Geocoding never ran
        assert_eq!(mock.geocode_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_geocode_empty_address_is_none() {
        let h = harness(Some(Arc::new(MockProvider::default())), false);
        assert!(h.geocoding.geocode_address(&Address::default()).await.is_none());
        assert_eq!(
            h.mock.as_ref().unwrap().geocode_calls.load(Ordering::SeqCst),
            0
        );
    }

    #[tokio::test]
    async fn test_geocode_results_are_cached() {
        let mock = Arc::new(MockProvider::default());
        *mock.geocode_response.lock().unwrap() = Some(Ok(Some(dc_geocode())));
        let h = harness(Some(Arc::clone(&mock)), false);

        let first = h.geocoding.geocode_address(&white_house()).await.expect("geocode");
        let second = h.geocoding.geocode_address(&white_house()).await.expect("cached");
        assert_eq!(mock.geocode_calls.load(Ordering::SeqCst), 1);
        assert!((first.latitude - second.latitude).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_geocode_reuses_validator_coordinates() {
        let mock = Arc::new(MockProvider::default());
        let mut validated = crate::address::ValidationResult::passthrough(&white_house());
        validated.coordinates = Some(Coordinates {
            latitude: 38.8977,
            longitude: -77.0365,
        });
        *mock.validate_response.lock().unwrap() = Some(Ok(validated));
        let h = harness(Some(Arc::clone(&mock)), false);

        // Prime the validation cache, then geocode the same address
        h.validation.validate_address(&white_house()).await;
        let result = h.geocoding.geocode_address(&white_house()).await.expect("reused");
        assert!((result.latitude - 38.8977).abs() < 1e-9);
        assert_eq!(mock.geocode_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_geocode_failure_is_none_and_uncached() {
        let mock = Arc::new(MockProvider::default());
        *mock.geocode_response.lock().unwrap() = Some(Err(
            crate::error_handling::ProviderError::Status {
                provider: "mock",
                status: 500,
            },
        ));
        let h = harness(Some(Arc::clone(&mock)), false);

        assert!(h.geocoding.geocode_address(&white_house()).await.is_none());
        // Failure fallback was not cached; the provider is consulted again
        h.geocoding.geocode_address(&white_house()).await;
        assert_eq!(mock.geocode_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_health_status_keys() {
        let h = harness(Some(Arc::new(MockProvider::default())), false);
        let health = h.geocoding.get_health_status().await;
        let keys: Vec<&str> = health.providers.keys().map(|k| k.as_str()).collect();
        assert!(keys.contains(&"mock:geocoding"));
        assert!(keys.contains(&"mock:validation"));
        assert!(keys.contains(&"mock:autocomplete"));
        for health in health.providers.values() {
            assert!(health.healthy);
            assert_eq!(health.circuit_state, "closed");
        }
    }

    #[tokio::test]
    async fn test_health_status_without_provider_is_empty() {
        let h = harness(None, false);
        let health = h.geocoding.get_health_status().await;
        assert!(health.providers.is_empty());
    }
}
