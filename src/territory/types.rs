//! Territory data model.

use serde::{Deserialize, Serialize};

use crate::address::Coordinates;

/// A named geographic rule deciding whether a utility serves a location.
///
/// Territories are independent; a point may match zero, one, or many.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Territory {
    /// Stable string key
    pub id: String,
    /// Display name
    pub name: String,
    /// Owning utility identifier (e.g. "pepco")
    pub utility: String,
    /// The matching rule and its payload
    #[serde(flatten)]
    pub rule: TerritoryRule,
}

/// Type-specific matching payload, tagged by `type` in the wire form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TerritoryRule {
    /// Point lies inside the approximate bounding box of any listed state.
    /// Boxes are rectangles, not political boundaries; false positives and
    /// negatives near borders are accepted
    State {
        /// Two-letter state codes
        states: Vec<String>,
    },
    /// Resolved ZIP of the point matches any pattern (exact, or prefix when
    /// the pattern ends in `*`, or 5-digit prefix against a ZIP+4)
    Zip {
        /// Patterns like "20815" or "208*"
        zip_codes: Vec<String>,
    },
    /// Point lies inside the polygon (ray casting over ordered vertices;
    /// fewer than 3 vertices never matches)
    Polygon {
        /// Ordered vertex list
        polygon: Vec<Coordinates>,
    },
    /// Great-circle distance from the center is within the radius
    Radius {
        /// Circle center
        center: Coordinates,
        /// Radius in miles
        radius_miles: f64,
    },
}

/// Territory payload submitted on save; a missing id means "create".
#[derive(Debug, Clone, Deserialize)]
pub struct TerritoryDraft {
    /// Existing id to overwrite, or absent to generate one
    #[serde(default)]
    pub id: Option<String>,
    /// Display name
    pub name: String,
    /// Owning utility identifier
    pub utility: String,
    /// The matching rule and its payload
    #[serde(flatten)]
    pub rule: TerritoryRule,
}

/// One territory a point fell inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerritoryMatch {
    /// Territory id
    pub id: String,
    /// Display name
    pub name: String,
    /// Owning utility identifier
    pub utility: String,
}

/// Outcome of a territory check: all matches, not just the first.
#[derive(Debug, Clone, Serialize)]
pub struct TerritoryVerdict {
    /// True when at least one territory matched
    pub in_territory: bool,
    /// Every matching territory
    pub matching_territories: Vec<TerritoryMatch>,
}
