//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (rate limits, circuit thresholds, cache TTLs)
//! - CLI option types and parsing
//! - Load-time configuration validation

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{Config, LogFormat, LogLevel, ProviderKind};
