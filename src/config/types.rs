//! Configuration types and CLI options.
//!
//! This module defines the configuration struct and the enums used for
//! command-line argument parsing. Provider credentials are never required at
//! parse time: a selected provider with missing credentials degrades to the
//! permissive no-provider behavior instead of refusing to start.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use strum_macros::Display;

use crate::config::constants::{
    CIRCUIT_FAILURE_THRESHOLD, CIRCUIT_RECOVERY_SECS, DEFAULT_SERVER_PORT, GEOCODE_CACHE_TTL_SECS,
    HTTP_TIMEOUT_SECS, RATE_LIMIT_REQUESTS, RATE_LIMIT_WINDOW_SECS, VALIDATION_CACHE_TTL_SECS,
};
use crate::error_handling::InitializationError;

/// Logging level for the application.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Which third-party provider backs validation, autocomplete, and geocoding.
///
/// Selected once at startup; the matching adapter is constructed by the
/// composition root. Adding a provider means implementing the
/// `AddressProvider` trait, not extending a switch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ProviderKind {
    /// No provider: validation passes everything through, geocoding is
    /// unavailable, territory checks that need a ZIP resolve to no match
    None,
    /// Google Places autocomplete/details plus the Geocoding API
    Google,
    /// USPS Web Tools address verification (no geocoding)
    Usps,
    /// SmartyStreets street-address and autocomplete APIs
    SmartyStreets,
}

/// Service configuration.
///
/// Populated once at startup from CLI flags and environment variables, with
/// documented defaults; validated at load time rather than per-access.
///
/// # Examples
///
/// ```no_run
/// use address_status::{Config, ProviderKind};
///
/// let config = Config {
///     provider: ProviderKind::Google,
///     google_api_key: Some("AIza...".into()),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Parser)]
#[command(
    name = "address_status",
    about = "Validates postal addresses and determines utility service-territory coverage"
)]
pub struct Config {
    /// Address provider backing validation, autocomplete, and geocoding
    #[arg(long, value_enum, default_value_t = ProviderKind::None)]
    pub provider: ProviderKind,

    /// Google Maps Platform API key
    #[arg(long, env = "GOOGLE_MAPS_API_KEY", hide_env_values = true)]
    pub google_api_key: Option<String>,

    /// USPS Web Tools user id
    #[arg(long, env = "USPS_USER_ID", hide_env_values = true)]
    pub usps_user_id: Option<String>,

    /// SmartyStreets auth id
    #[arg(long, env = "SMARTY_AUTH_ID", hide_env_values = true)]
    pub smarty_auth_id: Option<String>,

    /// SmartyStreets auth token
    #[arg(long, env = "SMARTY_AUTH_TOKEN", hide_env_values = true)]
    pub smarty_auth_token: Option<String>,

    /// Token required (via the x-admin-token header) on privileged territory
    /// routes; when unset those routes are open and a warning is logged
    #[arg(long, env = "ADDRESS_STATUS_ADMIN_TOKEN", hide_env_values = true)]
    pub admin_token: Option<String>,

    /// Port for the boundary HTTP server
    #[arg(long, default_value_t = DEFAULT_SERVER_PORT)]
    pub port: u16,

    /// Per-request timeout for outbound provider calls in seconds
    #[arg(long, default_value_t = HTTP_TIMEOUT_SECS)]
    pub timeout_seconds: u64,

    /// Maximum provider requests per rate-limit window
    #[arg(long, default_value_t = RATE_LIMIT_REQUESTS)]
    pub rate_limit_requests: u32,

    /// Rate-limit window length in seconds
    #[arg(long, default_value_t = RATE_LIMIT_WINDOW_SECS)]
    pub rate_limit_window_seconds: u64,

    /// Consecutive provider failures before the circuit opens
    #[arg(long, default_value_t = CIRCUIT_FAILURE_THRESHOLD)]
    pub circuit_failure_threshold: u32,

    /// Open-circuit recovery time in seconds
    #[arg(long, default_value_t = CIRCUIT_RECOVERY_SECS)]
    pub circuit_recovery_seconds: u64,

    /// TTL for cached validation results in seconds
    #[arg(long, default_value_t = VALIDATION_CACHE_TTL_SECS)]
    pub validation_cache_ttl_seconds: u64,

    /// TTL for cached geocoding results in seconds
    #[arg(long, default_value_t = GEOCODE_CACHE_TTL_SECS)]
    pub geocode_cache_ttl_seconds: u64,

    /// Disable provider-backed autocomplete (returns empty predictions)
    #[arg(long)]
    pub disable_autocomplete: bool,

    /// Disable provider-backed validation (every address passes through)
    #[arg(long)]
    pub disable_validation: bool,

    /// Treat a failed validation as out-of-territory instead of geocoding the
    /// address anyway
    #[arg(long)]
    pub strict_validation: bool,

    /// Directory for the durable cache and territory store; in-memory only
    /// when unset
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value = "plain")]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderKind::None,
            google_api_key: None,
            usps_user_id: None,
            smarty_auth_id: None,
            smarty_auth_token: None,
            admin_token: None,
            port: DEFAULT_SERVER_PORT,
            timeout_seconds: HTTP_TIMEOUT_SECS,
            rate_limit_requests: RATE_LIMIT_REQUESTS,
            rate_limit_window_seconds: RATE_LIMIT_WINDOW_SECS,
            circuit_failure_threshold: CIRCUIT_FAILURE_THRESHOLD,
            circuit_recovery_seconds: CIRCUIT_RECOVERY_SECS,
            validation_cache_ttl_seconds: VALIDATION_CACHE_TTL_SECS,
            geocode_cache_ttl_seconds: GEOCODE_CACHE_TTL_SECS,
            disable_autocomplete: false,
            disable_validation: false,
            strict_validation: false,
            cache_dir: None,
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
        }
    }
}

impl Config {
    /// Validates numeric sanity once at load time.
    ///
    /// Missing provider credentials are not an error here: the composition
    /// root degrades to the no-provider permissive behavior and logs a
    /// warning instead.
    pub fn validate(&self) -> Result<(), InitializationError> {
        if self.rate_limit_requests == 0 {
            return Err(InitializationError::InvalidConfig(
                "rate_limit_requests must be at least 1".into(),
            ));
        }
        if self.rate_limit_window_seconds == 0 {
            return Err(InitializationError::InvalidConfig(
                "rate_limit_window_seconds must be at least 1".into(),
            ));
        }
        if self.circuit_failure_threshold == 0 {
            return Err(InitializationError::InvalidConfig(
                "circuit_failure_threshold must be at least 1".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(InitializationError::InvalidConfig(
                "timeout_seconds must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Returns true when the selected provider has the credentials it needs.
    pub fn provider_credentials_present(&self) -> bool {
        match self.provider {
            ProviderKind::None => false,
            ProviderKind::Google => self.google_api_key.is_some(),
            ProviderKind::Usps => self.usps_user_id.is_some(),
            ProviderKind::SmartyStreets => {
                self.smarty_auth_id.is_some() && self.smarty_auth_token.is_some()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.provider, ProviderKind::None);
        assert_eq!(config.rate_limit_requests, 100);
        assert_eq!(config.rate_limit_window_seconds, 60);
        assert_eq!(config.circuit_failure_threshold, 5);
        assert_eq!(config.circuit_recovery_seconds, 300);
        assert_eq!(config.validation_cache_ttl_seconds, 24 * 60 * 60);
        assert_eq!(config.geocode_cache_ttl_seconds, 30 * 24 * 60 * 60);
        assert!(!config.strict_validation);
        config.validate().expect("defaults should validate");
    }

    #[test]
    fn test_validate_rejects_zero_rate_limit() {
        let config = Config {
            rate_limit_requests: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_threshold() {
        let config = Config {
            circuit_failure_threshold: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_provider_credentials_present() {
        let mut config = Config {
            provider: ProviderKind::Google,
            ..Default::default()
        };
        assert!(!config.provider_credentials_present());
        config.google_api_key = Some("key".into());
        assert!(config.provider_credentials_present());

        config.provider = ProviderKind::SmartyStreets;
        assert!(!config.provider_credentials_present());
        config.smarty_auth_id = Some("id".into());
        assert!(!config.provider_credentials_present());
        config.smarty_auth_token = Some("token".into());
        assert!(config.provider_credentials_present());
    }

    #[test]
    fn test_provider_kind_display() {
        assert_eq!(ProviderKind::Google.to_string(), "google");
        assert_eq!(ProviderKind::SmartyStreets.to_string(), "smarty-streets");
        assert_eq!(ProviderKind::None.to_string(), "none");
    }
}
