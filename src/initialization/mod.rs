//! Application initialization and resource setup.
//!
//! This module provides functions to initialize all shared resources:
//! - The HTTP client for outbound provider calls
//! - The logger
//! - The durable TTL store (file-backed or in-memory)
//!
//! All initialization functions return proper error types for error handling.

mod client;
mod logger;

use std::sync::Arc;

use crate::cache::{FileTtlStore, MemoryTtlStore, TtlStore};
use crate::config::Config;
use crate::error_handling::InitializationError;

// Re-export public API
pub use client::init_client;
pub use logger::init_logger_with;

/// Initializes the durable TTL store backing caches, the territory
/// collection, and resilience bookkeeping survivors.
///
/// Uses the file-backed store when `--cache-dir` is configured, otherwise an
/// in-memory store whose contents die with the process.
pub fn init_store(config: &Config) -> Result<Arc<dyn TtlStore>, InitializationError> {
    match &config.cache_dir {
        Some(dir) => {
            let store = FileTtlStore::open(dir)?;
            log::info!("Durable store: {}", dir.display());
            Ok(Arc::new(store))
        }
        None => {
            log::info!("Durable store: in-memory (state dies with the process)");
            Ok(Arc::new(MemoryTtlStore::new()))
        }
    }
}
