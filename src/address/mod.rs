//! Address data model.
//!
//! This module defines the types flowing through validation, geocoding, and
//! territory checks. Raw user input is never mutated in place: providers
//! produce a new standardized copy, and the original is carried along as the
//! fallback when a provider yields nothing.

use serde::{Deserialize, Serialize};

/// A postal address as submitted or standardized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Street line ("1600 Pennsylvania Ave NW")
    pub street: String,
    /// Secondary line (apartment, suite), when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street2: Option<String>,
    /// City name
    pub city: String,
    /// Two-letter state code
    pub state: String,
    /// 5-digit ZIP or ZIP+4
    pub zip: String,
}

impl Address {
    /// True when no field carries any content.
    pub fn is_empty(&self) -> bool {
        self.street.trim().is_empty()
            && self.city.trim().is_empty()
            && self.state.trim().is_empty()
            && self.zip.trim().is_empty()
    }

    /// Cache-key parts in stable field order.
    pub fn key_parts(&self) -> [&str; 5] {
        [
            &self.street,
            self.street2.as_deref().unwrap_or(""),
            &self.city,
            &self.state,
            &self.zip,
        ]
    }

    /// Single-line rendering for geocoding queries and display
    /// ("1600 Pennsylvania Ave NW, Washington, DC 20500").
    pub fn single_line(&self) -> String {
        let mut line = String::new();
        for part in [
            self.street.trim(),
            self.street2.as_deref().unwrap_or("").trim(),
            self.city.trim(),
        ] {
            if part.is_empty() {
                continue;
            }
            if !line.is_empty() {
                line.push_str(", ");
            }
            line.push_str(part);
        }
        let state_zip = format!("{} {}", self.state.trim(), self.zip.trim());
        let state_zip = state_zip.trim();
        if !state_zip.is_empty() {
            if !line.is_empty() {
                line.push_str(", ");
            }
            line.push_str(state_zip);
        }
        line
    }
}

/// A latitude/longitude pair. Both coordinates are always present together;
/// an address without a known location carries no `Coordinates` at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Degrees north
    pub latitude: f64,
    /// Degrees east
    pub longitude: f64,
}

/// Outcome of validating one address against a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the provider confirmed the address
    pub valid: bool,
    /// Standardized form; falls back to the submitted input when the
    /// provider yields nothing, so it is always populated
    pub standardized: Address,
    /// Human-readable problem descriptions, in the order found
    #[serde(default)]
    pub issues: Vec<String>,
    /// Alternative candidate addresses, when the provider returned any
    #[serde(default)]
    pub suggestions: Vec<Address>,
    /// Location of the standardized address, when the provider knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    /// USPS/SmartyStreets delivery-point-validation code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpv_confirmation: Option<String>,
    /// USPS carrier route, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier_route: Option<String>,
    /// Geocoder location precision (e.g. ROOFTOP, APPROXIMATE)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_precision: Option<String>,
}

impl ValidationResult {
    /// The permissive default: the address passes through untouched with no
    /// issues. Used when no provider is configured or validation is disabled.
    pub fn passthrough(address: &Address) -> Self {
        ValidationResult {
            valid: true,
            standardized: address.clone(),
            issues: Vec::new(),
            suggestions: Vec::new(),
            coordinates: None,
            dpv_confirmation: None,
            carrier_route: None,
            location_precision: None,
        }
    }

    /// The fail-open fallback: still valid, but carrying an issue explaining
    /// that validation was not actually performed.
    pub fn unverified(address: &Address, issue: impl Into<String>) -> Self {
        ValidationResult {
            issues: vec![issue.into()],
            ..Self::passthrough(address)
        }
    }
}

/// One autocomplete suggestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// Provider place id; absent for providers with no place-detail concept
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
    /// Full display string
    pub description: String,
    /// Primary portion (typically the street line)
    pub main_text: String,
    /// Secondary portion (typically city/state/ZIP)
    pub secondary_text: String,
}

/// A successfully geocoded location. Constructed only with both coordinates;
/// a failed geocode is represented by absence, never a partial pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeResult {
    /// Degrees north
    pub latitude: f64,
    /// Degrees east
    pub longitude: f64,
    /// Provider-formatted address line, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_address: Option<String>,
}

impl GeocodeResult {
    /// The coordinate pair of this result.
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}
