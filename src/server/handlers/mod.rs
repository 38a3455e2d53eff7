//! Boundary route handlers.

mod address;
mod health;
mod territory;

pub use address::{autocomplete_handler, geocode_handler, place_details_handler, validate_handler};
pub use health::health_handler;
pub use territory::{check_handler, delete_handler, list_handler, save_handler};
