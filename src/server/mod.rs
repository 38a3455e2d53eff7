//! HTTP boundary server.
//!
//! Exposes the validation, geocoding, and territory operations consumed by
//! the enrollment form wizard:
//! - `GET  /address/autocomplete` - predictions for a partial input
//! - `POST /address/validate` - full validation result
//! - `GET  /address/place-details` - resolve a place id, 404 when unknown
//! - `POST /geocode` - coordinates for an address, 404 when not geocodable
//! - `POST /territory/check` - territory verdict for a point or address
//! - `GET  /territories`, `POST /territory`, `DELETE /territory/{id}` -
//!   privileged territory CRUD
//! - `GET  /health` - per-provider circuit and rate-limit state
//!
//! Malformed requests are rejected here; nothing past this boundary throws.

mod handlers;
mod types;

use axum::routing::{delete, get, post};
use axum::Router;

use handlers::{
    autocomplete_handler, check_handler, delete_handler, geocode_handler, health_handler,
    list_handler, place_details_handler, save_handler, validate_handler,
};
pub use types::AppState;

/// Builds the boundary router over the shared service state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/address/autocomplete", get(autocomplete_handler))
        .route("/address/validate", post(validate_handler))
        .route("/address/place-details", get(place_details_handler))
        .route("/geocode", post(geocode_handler))
        .route("/territory/check", post(check_handler))
        .route("/territories", get(list_handler))
        .route("/territory", post(save_handler))
        .route("/territory/{id}", delete(delete_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Binds and serves the boundary server until ctrl-c.
pub async fn start_server(port: u16, state: AppState) -> Result<(), anyhow::Error> {
    if state.admin_token.is_none() {
        log::warn!("No admin token configured; territory CRUD routes are open");
    }

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind server to port {}: {}", port, e))?;

    log::info!("address_status listening on http://0.0.0.0:{}/", port);
    log::info!("  - Health: http://127.0.0.1:{}/health", port);
    log::info!("  - Validate: POST http://127.0.0.1:{}/address/validate", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("Shutdown signal received, draining connections");
        })
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
