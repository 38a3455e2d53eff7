//! Service-territory determination.
//!
//! This module provides:
//! - Territory types (state / zip / polygon / radius rules)
//! - Geometric primitives (haversine, ray casting, state bounding boxes)
//! - `TerritoryEngine`: evaluates points against the configured territories
//!   and owns territory CRUD, persisting the full collection on every
//!   mutation (no partial writes)
//!
//! Territory edits are rare, admin-only operations; concurrent saves race
//! with last-writer-wins and no further coordination.

mod geometry;
mod types;

pub use geometry::{haversine_miles, point_in_polygon, state_bounds, zip_matches, EARTH_RADIUS_MILES};
pub use types::{Territory, TerritoryDraft, TerritoryMatch, TerritoryRule, TerritoryVerdict};

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::address::Coordinates;
use crate::cache::TtlStore;

/// Store key holding the entire territory collection.
const TERRITORIES_KEY: &str = "territories";

/// Resolves a coordinate pair to its ZIP code.
///
/// Implemented by the geocoding layer on top of the provider's reverse
/// geocoder; absent entirely when no provider can reverse-geocode, in which
/// case ZIP territories simply never match.
#[async_trait]
pub trait ZipResolver: Send + Sync {
    /// ZIP code at the point, or `None` when it cannot be determined.
    async fn resolve_zip(&self, latitude: f64, longitude: f64) -> Option<String>;
}

/// Evaluates whether coordinates fall inside configured service territories.
pub struct TerritoryEngine {
    store: Arc<dyn TtlStore>,
    territories: RwLock<Vec<Territory>>,
    zip_resolver: Option<Arc<dyn ZipResolver>>,
}

impl TerritoryEngine {
    /// Creates the engine, loading the persisted collection or installing
    /// the default seed territories when none have been configured yet.
    pub fn new(store: Arc<dyn TtlStore>, zip_resolver: Option<Arc<dyn ZipResolver>>) -> Self {
        let territories = match store.get(TERRITORIES_KEY) {
            Some(raw) => match serde_json::from_str::<Vec<Territory>>(&raw) {
                Ok(territories) => territories,
                Err(e) => {
                    log::error!("Discarding unreadable territory collection: {}", e);
                    default_territories()
                }
            },
            None => {
                log::info!("No territories configured; installing defaults");
                default_territories()
            }
        };

        TerritoryEngine {
            store,
            territories: RwLock::new(territories),
            zip_resolver,
        }
    }

    /// The full territory collection.
    pub async fn list_territories(&self) -> Vec<Territory> {
        self.territories.read().await.clone()
    }

    /// Inserts or overwrites one territory and persists the collection.
    /// Returns the territory's id (generated when the draft carried none).
    pub async fn save_territory(&self, draft: TerritoryDraft) -> String {
        let id = draft
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(generate_territory_id);
        let territory = Territory {
            id: id.clone(),
            name: draft.name,
            utility: draft.utility,
            rule: draft.rule,
        };

        let mut territories = self.territories.write().await;
        match territories.iter_mut().find(|t| t.id == id) {
            Some(existing) => *existing = territory,
            None => territories.push(territory),
        }
        self.persist(&territories);
        id
    }

    /// Removes one territory by id; false when the id is unknown.
    pub async fn delete_territory(&self, id: &str) -> bool {
        let mut territories = self.territories.write().await;
        let before = territories.len();
        territories.retain(|t| t.id != id);
        if territories.len() == before {
            return false;
        }
        self.persist(&territories);
        true
    }

    /// Tests the point against every territory, optionally filtered to one
    /// utility. All matches are returned, not just the first.
    pub async fn check_service_territory(
        &self,
        latitude: f64,
        longitude: f64,
        utility: Option<&str>,
    ) -> TerritoryVerdict {
        let territories = self.territories.read().await;
        let candidates: Vec<&Territory> = territories
            .iter()
            .filter(|t| match utility {
                Some(utility) => t.utility.eq_ignore_ascii_case(utility),
                None => true,
            })
            .collect();

        // Resolve the ZIP at most once, and only when a zip rule is in play
        let resolved_zip = if candidates
            .iter()
            .any(|t| matches!(t.rule, TerritoryRule::Zip { .. }))
        {
            match &self.zip_resolver {
                Some(resolver) => resolver.resolve_zip(latitude, longitude).await,
                None => None,
            }
        } else {
            None
        };

        let matching_territories: Vec<TerritoryMatch> = candidates
            .into_iter()
            .filter(|t| rule_matches(&t.rule, latitude, longitude, resolved_zip.as_deref()))
            .map(|t| TerritoryMatch {
                id: t.id.clone(),
                name: t.name.clone(),
                utility: t.utility.clone(),
            })
            .collect();

        TerritoryVerdict {
            in_territory: !matching_territories.is_empty(),
            matching_territories,
        }
    }

    fn persist(&self, territories: &[Territory]) {
        match serde_json::to_string(territories) {
            Ok(raw) => self.store.set(TERRITORIES_KEY, &raw, None),
            Err(e) => log::error!("Failed to serialize territory collection: {}", e),
        }
    }
}

fn rule_matches(
    rule: &TerritoryRule,
    latitude: f64,
    longitude: f64,
    resolved_zip: Option<&str>,
) -> bool {
    match rule {
        TerritoryRule::State { states } => states.iter().any(|code| {
            state_bounds(code)
                .map(|bounds| bounds.contains(latitude, longitude))
                .unwrap_or(false)
        }),
        TerritoryRule::Zip { zip_codes } => match resolved_zip {
            Some(zip) => zip_codes.iter().any(|pattern| zip_matches(pattern, zip)),
            // No reverse-geocode capability: no match, never an error
            None => false,
        },
        TerritoryRule::Polygon { polygon } => point_in_polygon(latitude, longitude, polygon),
        TerritoryRule::Radius {
            center,
            radius_miles,
        } => {
            let point = Coordinates {
                latitude,
                longitude,
            };
            haversine_miles(point, *center) <= *radius_miles
        }
    }
}

fn generate_territory_id() -> String {
    format!("terr_{:016x}", rand::random::<u64>())
}

/// Demonstration seed territories installed when none are configured.
fn default_territories() -> Vec<Territory> {
    vec![
        Territory {
            id: "seed_pepco_dc_metro".to_string(),
            name: "Pepco DC Metro".to_string(),
            utility: "pepco".to_string(),
            rule: TerritoryRule::State {
                states: vec!["DC".to_string(), "MD".to_string()],
            },
        },
        Territory {
            id: "seed_bge_central_md".to_string(),
            name: "BGE Central Maryland".to_string(),
            utility: "bge".to_string(),
            rule: TerritoryRule::Zip {
                zip_codes: vec!["210*".to_string(), "212*".to_string()],
            },
        },
        Territory {
            id: "seed_dominion_nova".to_string(),
            name: "Dominion Northern Virginia".to_string(),
            utility: "dominion".to_string(),
            rule: TerritoryRule::Radius {
                center: Coordinates {
                    latitude: 38.8816,
                    longitude: -77.0910,
                },
                radius_miles: 25.0,
            },
        },
    ]
}
