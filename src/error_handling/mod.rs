//! Error handling.
//!
//! This module provides:
//! - Initialization error types (logger, HTTP client, store, config)
//! - The typed provider-failure enum used by the resilience layer to decide
//!   what counts against a circuit breaker
//!
//! Nothing in the core throws past its own public methods under normal
//! operation: every service method has a defined fallback value for every
//! failure mode, and these types stay inside the adapter/guard boundary.

mod types;

// Re-export public API
pub use types::{InitializationError, ProviderError};
