//! HTTP boundary data structures.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::address::{Address, Coordinates, Prediction};
use crate::geocoding::GeocodingService;
use crate::territory::TerritoryMatch;
use crate::validation::AddressValidationService;

/// Shared state for the boundary server.
#[derive(Clone)]
pub struct AppState {
    /// Validation service
    pub validation: Arc<AddressValidationService>,
    /// Geocoding service (owns the territory engine)
    pub geocoding: Arc<GeocodingService>,
    /// Token required on privileged territory routes, when set
    pub admin_token: Option<Arc<str>>,
}

/// Address fields as submitted over the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressPayload {
    /// Street line
    #[serde(default)]
    pub street: String,
    /// Secondary line
    #[serde(default)]
    pub street2: Option<String>,
    /// City
    #[serde(default)]
    pub city: String,
    /// State code
    #[serde(default)]
    pub state: String,
    /// ZIP code
    #[serde(default)]
    pub zip: String,
}

impl From<AddressPayload> for Address {
    fn from(payload: AddressPayload) -> Self {
        Address {
            street: payload.street,
            street2: payload.street2.filter(|s| !s.trim().is_empty()),
            city: payload.city,
            state: payload.state,
            zip: payload.zip,
        }
    }
}

/// Query parameters for `GET /address/autocomplete`.
#[derive(Debug, Deserialize)]
pub struct AutocompleteParams {
    /// Partial input typed so far
    #[serde(default)]
    pub input: String,
    /// Opaque billing-session token, passed through to the provider
    #[serde(default)]
    pub session_token: Option<String>,
}

/// Query parameters for `GET /address/place-details`.
#[derive(Debug, Deserialize)]
pub struct PlaceDetailsParams {
    /// Provider place id from a prior autocomplete
    pub place_id: String,
    /// Opaque billing-session token, passed through to the provider
    #[serde(default)]
    pub session_token: Option<String>,
}

/// Response body for `GET /address/autocomplete`.
#[derive(Debug, Serialize)]
pub struct PredictionsResponse {
    /// Autocomplete suggestions, possibly empty
    pub predictions: Vec<Prediction>,
}

/// Response body for `POST /geocode`.
#[derive(Debug, Serialize)]
pub struct GeocodeResponse {
    /// Whether geocoding produced coordinates
    pub success: bool,
    /// Degrees north
    pub latitude: f64,
    /// Degrees east
    pub longitude: f64,
    /// Provider-formatted address, when reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted_address: Option<String>,
}

/// Request body for `POST /territory/check`: either explicit coordinates or
/// an address to geocode, plus an optional utility filter.
#[derive(Debug, Default, Deserialize)]
pub struct TerritoryCheckRequest {
    /// Point latitude, when the caller already has coordinates
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Point longitude, when the caller already has coordinates
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Street line of an address to geocode instead
    #[serde(default)]
    pub street: Option<String>,
    /// Secondary line
    #[serde(default)]
    pub street2: Option<String>,
    /// City
    #[serde(default)]
    pub city: Option<String>,
    /// State code
    #[serde(default)]
    pub state: Option<String>,
    /// ZIP code
    #[serde(default)]
    pub zip: Option<String>,
    /// Restrict matching to one utility
    #[serde(default)]
    pub utility: Option<String>,
}

impl TerritoryCheckRequest {
    /// Explicit coordinates, when both were supplied.
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }

    /// Address assembled from the request fields, when any were supplied.
    pub fn address(&self) -> Option<Address> {
        let address = Address {
            street: self.street.clone().unwrap_or_default(),
            street2: self.street2.clone().filter(|s| !s.trim().is_empty()),
            city: self.city.clone().unwrap_or_default(),
            state: self.state.clone().unwrap_or_default(),
            zip: self.zip.clone().unwrap_or_default(),
        };
        if address.is_empty() {
            None
        } else {
            Some(address)
        }
    }
}

/// Response body for `POST /territory/check`.
#[derive(Debug, Serialize)]
pub struct TerritoryCheckResponse {
    /// Whether a territory decision was made
    pub success: bool,
    /// The decision, absent when the point could not be determined
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_territory: Option<bool>,
    /// Every matching territory
    pub matching_territories: Vec<TerritoryMatch>,
    /// Latitude the check ran against, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    /// Longitude the check ran against, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// Explanation when no decision was made
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response body for `POST /territory`.
#[derive(Debug, Serialize)]
pub struct SaveTerritoryResponse {
    /// Id of the saved territory (generated when the draft carried none)
    pub id: String,
}

/// Generic error body for boundary rejections.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always false
    pub success: bool,
    /// Human-readable reason
    pub message: String,
}

impl ErrorResponse {
    /// Creates an error body with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        ErrorResponse {
            success: false,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_payload_conversion_drops_blank_street2() {
        let payload = AddressPayload {
            street: "123 Main St".to_string(),
            street2: Some("   ".to_string()),
            city: "Washington".to_string(),
            state: "DC".to_string(),
            zip: "20500".to_string(),
        };
        let address: Address = payload.into();
        assert_eq!(address.street2, None);
    }

    #[test]
    fn test_territory_check_request_coordinates_require_both() {
        let request = TerritoryCheckRequest {
            latitude: Some(38.9),
            ..Default::default()
        };
        assert!(request.coordinates().is_none());

        let request = TerritoryCheckRequest {
            latitude: Some(38.9),
            longitude: Some(-77.0),
            ..Default::default()
        };
        assert!(request.coordinates().is_some());
    }

    #[test]
    fn test_territory_check_request_address_requires_content() {
        let request = TerritoryCheckRequest::default();
        assert!(request.address().is_none());

        let request = TerritoryCheckRequest {
            street: Some("123 Main St".to_string()),
            city: Some("Washington".to_string()),
            ..Default::default()
        };
        let address = request.address().expect("address");
        assert_eq!(address.street, "123 Main St");
    }
}
