//! Third-party address provider adapters.
//!
//! Each adapter translates one provider's request/response shapes into the
//! normalized result types. Provider selection happens once at construction:
//! callers hold an `Arc<dyn AddressProvider>` and new providers implement the
//! trait instead of extending a switch.
//!
//! Adapters distinguish two failure classes deliberately:
//! - Business rejections (zero results, DPV says not deliverable) are `Ok`
//!   values carried in the result types; they never trip the circuit breaker.
//! - Transport and upstream-server failures are `Err(ProviderError)` and are
//!   recorded by the resilience guard.

mod google;
mod smarty;
mod usps;

pub use google::GoogleProvider;
pub use smarty::SmartyStreetsProvider;
pub use usps::UspsProvider;

use std::sync::Arc;

use async_trait::async_trait;

use crate::address::{Address, GeocodeResult, Prediction, ValidationResult};
use crate::config::{Config, ProviderKind};
use crate::error_handling::ProviderError;

// Issue strings shared across providers. The USPS and SmartyStreets DPV
// mappings intentionally produce identical wording.
/// DPV code N: the address does not exist in the delivery database
pub const ISSUE_NOT_FOUND: &str = "Address not found in database";
/// DPV code S: a secondary (apartment/suite) number is required but missing
pub const ISSUE_SECONDARY_MISSING: &str = "Secondary address missing";
/// DPV code D: the secondary number given does not match a delivery point
pub const ISSUE_SECONDARY_INCORRECT: &str = "Secondary address incorrect";
/// Geocoder matched only part of the query
pub const ISSUE_PARTIAL_MATCH: &str = "Partial match";
/// Geocoder located the address only approximately
pub const ISSUE_APPROXIMATE_LOCATION: &str = "Approximate location";
/// Fail-open marker: the provider was unreachable or not configured
pub const ISSUE_NOT_PERFORMED: &str = "Address validation was not performed";

/// A third-party address provider.
///
/// Default implementations cover capabilities a provider lacks (USPS has no
/// autocomplete or geocoding; only Google has place details), so adapters
/// override only what their API supports.
#[async_trait]
pub trait AddressProvider: Send + Sync {
    /// Short provider name used for resilience keys and logging.
    fn name(&self) -> &'static str;

    /// Autocomplete suggestions for a partial input.
    async fn autocomplete(
        &self,
        _input: &str,
        _session_token: Option<&str>,
    ) -> Result<Vec<Prediction>, ProviderError> {
        Ok(Vec::new())
    }

    /// Validates and standardizes one address.
    async fn validate(&self, address: &Address) -> Result<ValidationResult, ProviderError>;

    /// Resolves a place id from autocomplete into a full address.
    async fn place_details(
        &self,
        _place_id: &str,
        _session_token: Option<&str>,
    ) -> Result<Option<Address>, ProviderError> {
        Ok(None)
    }

    /// Geocodes an address to coordinates. `Ok(None)` means the provider
    /// found nothing (or cannot geocode at all), not that the call failed.
    async fn geocode(&self, _address: &Address) -> Result<Option<GeocodeResult>, ProviderError> {
        Ok(None)
    }

    /// Reverse-geocodes a point to its ZIP code, when supported.
    async fn reverse_geocode_zip(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> Result<Option<String>, ProviderError> {
        Ok(None)
    }
}

/// Builds the configured provider adapter, or `None` when no provider is
/// selected or its credentials are missing. Missing credentials degrade to
/// the permissive no-provider behavior rather than failing startup.
pub fn build_provider(
    config: &Config,
    client: Arc<reqwest::Client>,
) -> Option<Arc<dyn AddressProvider>> {
    match config.provider {
        ProviderKind::None => None,
        ProviderKind::Google => match &config.google_api_key {
            Some(key) => Some(Arc::new(GoogleProvider::new(client, key.clone()))),
            None => {
                log::warn!(
                    "Provider google selected but GOOGLE_MAPS_API_KEY is not set; \
                     address validation will pass through unverified"
                );
                None
            }
        },
        ProviderKind::Usps => match &config.usps_user_id {
            Some(user_id) => Some(Arc::new(UspsProvider::new(client, user_id.clone()))),
            None => {
                log::warn!(
                    "Provider usps selected but USPS_USER_ID is not set; \
                     address validation will pass through unverified"
                );
                None
            }
        },
        ProviderKind::SmartyStreets => {
            match (&config.smarty_auth_id, &config.smarty_auth_token) {
                (Some(id), Some(token)) => Some(Arc::new(SmartyStreetsProvider::new(
                    client,
                    id.clone(),
                    token.clone(),
                ))),
                _ => {
                    log::warn!(
                        "Provider smarty-streets selected but SMARTY_AUTH_ID/SMARTY_AUTH_TOKEN \
                         are not both set; address validation will pass through unverified"
                    );
                    None
                }
            }
        }
    }
}
