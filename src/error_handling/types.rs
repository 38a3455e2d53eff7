//! Error type definitions.
//!
//! Provider adapters return explicit `Result` values instead of throwing
//! through the call stack: transport and upstream-server failures are
//! `ProviderError` (and count against the circuit breaker), while business
//! rejections like "address not found" are ordinary `Ok` values carried in
//! the result types themselves.

use log::SetLoggerError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] reqwest::Error),

    /// A configuration value failed load-time validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The durable store directory could not be prepared.
    #[error("Store initialization error: {0}")]
    StoreError(String),
}

/// A failed outbound provider call.
///
/// Every variant here is a transport- or server-side failure and is recorded
/// against the provider's circuit breaker. Zero-results responses and DPV
/// rejections are deliberately NOT represented here.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The request never completed (connect error, timeout, TLS failure).
    #[error("provider request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The provider answered with a non-success HTTP status.
    #[error("{provider} returned HTTP {status}")]
    Status {
        /// Provider name for logging
        provider: &'static str,
        /// HTTP status code
        status: u16,
    },

    /// The provider reported a server-side error in its response body
    /// (e.g. Google OVER_QUERY_LIMIT / REQUEST_DENIED / UNKNOWN_ERROR).
    #[error("{provider} reported upstream error: {status}")]
    Upstream {
        /// Provider name for logging
        provider: &'static str,
        /// Provider-specific error code or description
        status: String,
    },

    /// The response body could not be parsed into the expected shape.
    #[error("failed to decode {provider} response: {detail}")]
    Decode {
        /// Provider name for logging
        provider: &'static str,
        /// What failed to parse
        detail: String,
    },
}
