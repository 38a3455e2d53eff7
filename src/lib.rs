//! address_status library: address validation and service-territory determination
//!
//! This library validates postal addresses against third-party providers
//! (Google, USPS, SmartyStreets), geocodes them, and decides whether the
//! resulting point falls inside configured utility service territories.
//! Every outbound provider call is cached, rate limited, and circuit broken,
//! and every failure mode degrades to a usable fallback: enrollment flows
//! built on this service are never blocked by a third-party outage.
//!
//! # Example
//!
//! ```no_run
//! use address_status::{build_services, Address, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let services = build_services(&Config::default())?;
//! let verdict = services
//!     .geocoding
//!     .validate_service_address(
//!         &Address {
//!             street: "1600 Pennsylvania Ave NW".into(),
//!             city: "Washington".into(),
//!             state: "DC".into(),
//!             zip: "20500".into(),
//!             ..Default::default()
//!         },
//!         Some("pepco"),
//!     )
//!     .await;
//! println!("{}", verdict.message);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your
//! application or ensure you're calling library functions within an async
//! context.

#![warn(missing_docs)]

mod address;
mod cache;
pub mod config;
mod error_handling;
mod geocoding;
pub mod initialization;
mod providers;
mod resilience;
pub mod server;
mod territory;
mod validation;

// Re-export public API
pub use address::{Address, Coordinates, GeocodeResult, Prediction, ValidationResult};
pub use bootstrap::{build_services, run_server, Services};
pub use cache::{FileTtlStore, MemoryTtlStore, ResultCache, TtlStore};
pub use config::{Config, LogFormat, LogLevel, ProviderKind};
pub use error_handling::{InitializationError, ProviderError};
pub use geocoding::{
    GeocodingOptions, GeocodingService, HealthStatus, ServiceAddressVerdict,
};
pub use providers::{
    build_provider, AddressProvider, GoogleProvider, SmartyStreetsProvider, UspsProvider,
};
pub use resilience::{
    LogObserver, ProviderHealth, ResilienceGuard, ResilienceObserver, ResilienceSettings,
};
pub use territory::{
    Territory, TerritoryDraft, TerritoryEngine, TerritoryMatch, TerritoryRule, TerritoryVerdict,
    ZipResolver,
};
pub use validation::{AddressValidationService, ValidationOptions};

// Composition root: constructs the service graph from configuration.
mod bootstrap {
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::{Context, Result};

    use crate::config::Config;
    use crate::geocoding::{GeocodingOptions, GeocodingService};
    use crate::initialization::{init_client, init_store};
    use crate::providers::build_provider;
    use crate::resilience::{LogObserver, ResilienceGuard, ResilienceSettings};
    use crate::server::{start_server, AppState};
    use crate::validation::{AddressValidationService, ValidationOptions};

    /// The constructed service graph. Services are explicit instances passed
    /// to callers; there is no ambient global lookup.
    pub struct Services {
        /// Address validation and autocomplete
        pub validation: Arc<AddressValidationService>,
        /// Geocoding, territory engine, combined verdicts, health
        pub geocoding: Arc<GeocodingService>,
    }

    /// Builds the service graph from a validated configuration.
    ///
    /// A selected provider with missing credentials degrades to the
    /// permissive no-provider behavior (a warning is logged); only genuinely
    /// invalid configuration or resource failures are errors.
    ///
    /// # Errors
    ///
    /// Returns an error when configuration fails load-time validation, the
    /// HTTP client cannot be constructed, or the durable store directory
    /// cannot be prepared.
    pub fn build_services(config: &Config) -> Result<Services> {
        config.validate().context("Configuration rejected")?;

        let client = init_client(config).context("Failed to initialize HTTP client")?;
        let store = init_store(config).context("Failed to initialize durable store")?;
        let provider = build_provider(config, client);
        let provider_misconfigured = provider.is_none()
            && config.provider != crate::config::ProviderKind::None;

        let guard = Arc::new(ResilienceGuard::new(
            ResilienceSettings {
                rate_limit_requests: config.rate_limit_requests,
                rate_limit_window: Duration::from_secs(config.rate_limit_window_seconds),
                failure_threshold: config.circuit_failure_threshold,
                recovery_time: Duration::from_secs(config.circuit_recovery_seconds),
            },
            Arc::new(LogObserver),
        ));

        let validation = Arc::new(AddressValidationService::new(
            provider.clone(),
            Arc::clone(&guard),
            Arc::clone(&store),
            ValidationOptions {
                autocomplete_enabled: !config.disable_autocomplete,
                validation_enabled: !config.disable_validation,
                provider_misconfigured,
                cache_ttl: Duration::from_secs(config.validation_cache_ttl_seconds),
            },
        ));

        let geocoding = Arc::new(GeocodingService::new(
            provider,
            guard,
            Arc::clone(&validation),
            store,
            GeocodingOptions {
                cache_ttl: Duration::from_secs(config.geocode_cache_ttl_seconds),
                strict_validation: config.strict_validation,
            },
        ));

        Ok(Services {
            validation,
            geocoding,
        })
    }

    /// Builds the services and runs the boundary HTTP server until ctrl-c.
    ///
    /// # Errors
    ///
    /// Returns an error when service construction fails or the server cannot
    /// bind its port.
    pub async fn run_server(config: Config) -> Result<()> {
        let services = build_services(&config)?;
        let state = AppState {
            validation: services.validation,
            geocoding: services.geocoding,
            admin_token: config.admin_token.as_deref().map(Arc::from),
        };
        start_server(config.port, state).await
    }

}
