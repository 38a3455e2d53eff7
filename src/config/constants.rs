//! Configuration constants.
//!
//! This module defines the operational defaults used throughout the service:
//! rate-limit windows, circuit-breaker thresholds, cache TTLs, and network
//! timeouts. All of them can be overridden from the CLI or environment.

// Outbound provider protection
/// Maximum provider requests allowed within one rate-limit window
pub const RATE_LIMIT_REQUESTS: u32 = 100;
/// Rate-limit window length in seconds
/// The window is fixed-length: the counter resets when the window elapses,
/// there is no manual reset operation
pub const RATE_LIMIT_WINDOW_SECS: u64 = 60;
/// Consecutive provider failures before the circuit opens
pub const CIRCUIT_FAILURE_THRESHOLD: u32 = 5;
/// How long an open circuit stays open, and how long a failure streak is
/// remembered before it decays, in seconds
pub const CIRCUIT_RECOVERY_SECS: u64 = 300;

// Result caching
/// Address validation results are cached for 24 hours
pub const VALIDATION_CACHE_TTL_SECS: u64 = 24 * 60 * 60;
/// Geocoding results are cached for 30 days (coordinates for a postal
/// address change effectively never)
pub const GEOCODE_CACHE_TTL_SECS: u64 = 30 * 24 * 60 * 60;
/// Reverse-geocoded ZIP codes are cached for 30 days
pub const REVERSE_GEOCODE_CACHE_TTL_SECS: u64 = 30 * 24 * 60 * 60;

// Network operation timeouts
/// Per-request timeout for outbound provider calls in seconds
/// A timed-out call is treated like any other provider failure
pub const HTTP_TIMEOUT_SECS: u64 = 10;

// Autocomplete
/// Minimum input length before autocomplete queries a provider
pub const AUTOCOMPLETE_MIN_INPUT_CHARS: usize = 3;
/// Maximum number of candidate addresses requested from providers that
/// support returning alternatives
pub const MAX_SUGGESTION_CANDIDATES: usize = 3;

// HTTP boundary
/// Default port for the boundary HTTP server
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// User-Agent sent on outbound provider requests
pub const DEFAULT_USER_AGENT: &str = concat!("address_status/", env!("CARGO_PKG_VERSION"));
