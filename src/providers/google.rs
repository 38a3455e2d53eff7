//! Google Places / Geocoding adapter.
//!
//! Validation rides on the Geocoding API (Google has no dedicated verify
//! endpoint in this integration): a geocode hit standardizes the address and
//! supplies coordinates, with "Partial match" and "Approximate location"
//! surfaced as issues. Autocomplete and place details use the Places API
//! with pass-through session tokens for provider-side billing grouping.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use super::{
    AddressProvider, ISSUE_APPROXIMATE_LOCATION, ISSUE_NOT_FOUND, ISSUE_PARTIAL_MATCH,
};
use crate::address::{Address, GeocodeResult, Prediction, ValidationResult};
use crate::error_handling::ProviderError;

const AUTOCOMPLETE_URL: &str = "https://maps.googleapis.com/maps/api/place/autocomplete/json";
const DETAILS_URL: &str = "https://maps.googleapis.com/maps/api/place/details/json";
const GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Google Maps Platform adapter.
pub struct GoogleProvider {
    client: Arc<reqwest::Client>,
    api_key: String,
}

impl GoogleProvider {
    /// Creates an adapter using `client` and the given API key.
    pub fn new(client: Arc<reqwest::Client>, api_key: String) -> Self {
        GoogleProvider { client, api_key }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let response = self.client.get(url).query(params).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                provider: "google",
                status: status.as_u16(),
            });
        }
        response.json::<T>().await.map_err(|e| ProviderError::Decode {
            provider: "google",
            detail: e.to_string(),
        })
    }
}

/// Separates Google's business statuses from server-side failures. OK,
/// ZERO_RESULTS, and NOT_FOUND are legitimate answers; quota and auth
/// problems count against the circuit breaker.
fn check_status(status: &str) -> Result<(), ProviderError> {
    match status {
        "OK" | "ZERO_RESULTS" | "NOT_FOUND" => Ok(()),
        _ => Err(ProviderError::Upstream {
            provider: "google",
            status: status.to_string(),
        }),
    }
}

#[derive(Debug, Deserialize)]
struct AutocompleteResponse {
    status: String,
    #[serde(default)]
    predictions: Vec<GooglePrediction>,
}

#[derive(Debug, Deserialize)]
struct GooglePrediction {
    place_id: String,
    description: String,
    #[serde(default)]
    structured_formatting: StructuredFormatting,
}

#[derive(Debug, Default, Deserialize)]
struct StructuredFormatting {
    #[serde(default)]
    main_text: String,
    #[serde(default)]
    secondary_text: String,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    result: Option<PlaceDetails>,
}

#[derive(Debug, Deserialize)]
struct PlaceDetails {
    #[serde(default)]
    address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeHit>,
}

#[derive(Debug, Deserialize)]
struct GeocodeHit {
    #[serde(default)]
    formatted_address: Option<String>,
    #[serde(default)]
    partial_match: bool,
    geometry: Geometry,
    #[serde(default)]
    address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Location,
    #[serde(default)]
    location_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Location {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    long_name: String,
    short_name: String,
    types: Vec<String>,
}

/// Assembles a normalized `Address` from Google's typed component array.
fn address_from_components(components: &[AddressComponent]) -> Address {
    let find_long = |wanted: &str| {
        components
            .iter()
            .find(|c| c.types.iter().any(|t| t == wanted))
            .map(|c| c.long_name.clone())
    };
    let find_short = |wanted: &str| {
        components
            .iter()
            .find(|c| c.types.iter().any(|t| t == wanted))
            .map(|c| c.short_name.clone())
    };

    let street_number = find_long("street_number");
    let route = find_long("route");
    let street = match (street_number, route) {
        (Some(number), Some(route)) => format!("{} {}", number, route),
        (None, Some(route)) => route,
        (Some(number), None) => number,
        (None, None) => String::new(),
    };

    let mut zip = find_long("postal_code").unwrap_or_default();
    if let Some(suffix) = find_long("postal_code_suffix") {
        if !zip.is_empty() {
            zip = format!("{}-{}", zip, suffix);
        }
    }

    Address {
        street,
        street2: find_long("subpremise"),
        city: find_long("locality")
            .or_else(|| find_long("sublocality"))
            .or_else(|| find_long("postal_town"))
            .unwrap_or_default(),
        state: find_short("administrative_area_level_1").unwrap_or_default(),
        zip,
    }
}

/// Maps a geocode response onto a validation result for `address`.
fn validation_from_geocode(address: &Address, response: &GeocodeResponse) -> ValidationResult {
    let Some(hit) = response.results.first() else {
        let mut result = ValidationResult::passthrough(address);
        result.valid = false;
        result.issues.push(ISSUE_NOT_FOUND.to_string());
        return result;
    };

    let standardized = address_from_components(&hit.address_components);
    let mut issues = Vec::new();
    if hit.partial_match {
        issues.push(ISSUE_PARTIAL_MATCH.to_string());
    }
    let location_precision = hit.geometry.location_type.clone();
    if location_precision.as_deref() == Some("APPROXIMATE") {
        issues.push(ISSUE_APPROXIMATE_LOCATION.to_string());
    }

    ValidationResult {
        valid: true,
        standardized: if standardized.is_empty() {
            address.clone()
        } else {
            standardized
        },
        issues,
        suggestions: Vec::new(),
        coordinates: Some(crate::address::Coordinates {
            latitude: hit.geometry.location.lat,
            longitude: hit.geometry.location.lng,
        }),
        dpv_confirmation: None,
        carrier_route: None,
        location_precision,
    }
}

#[async_trait]
impl AddressProvider for GoogleProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn autocomplete(
        &self,
        input: &str,
        session_token: Option<&str>,
    ) -> Result<Vec<Prediction>, ProviderError> {
        let mut params = vec![
            ("input", input),
            ("key", self.api_key.as_str()),
            ("types", "address"),
            ("components", "country:us"),
        ];
        if let Some(token) = session_token {
            params.push(("sessiontoken", token));
        }

        let response: AutocompleteResponse = self.get_json(AUTOCOMPLETE_URL, &params).await?;
        check_status(&response.status)?;

        Ok(response
            .predictions
            .into_iter()
            .map(|p| Prediction {
                place_id: Some(p.place_id),
                description: p.description,
                main_text: p.structured_formatting.main_text,
                secondary_text: p.structured_formatting.secondary_text,
            })
            .collect())
    }

    async fn validate(&self, address: &Address) -> Result<ValidationResult, ProviderError> {
        let single_line = address.single_line();
        let params = [
            ("address", single_line.as_str()),
            ("components", "country:US"),
            ("key", self.api_key.as_str()),
        ];

        let response: GeocodeResponse = self.get_json(GEOCODE_URL, &params).await?;
        check_status(&response.status)?;

        Ok(validation_from_geocode(address, &response))
    }

    async fn place_details(
        &self,
        place_id: &str,
        session_token: Option<&str>,
    ) -> Result<Option<Address>, ProviderError> {
        let mut params = vec![
            ("place_id", place_id),
            ("fields", "address_component"),
            ("key", self.api_key.as_str()),
        ];
        if let Some(token) = session_token {
            params.push(("sessiontoken", token));
        }

        let response: DetailsResponse = self.get_json(DETAILS_URL, &params).await?;
        check_status(&response.status)?;

        Ok(response
            .result
            .map(|details| address_from_components(&details.address_components))
            .filter(|address| !address.is_empty()))
    }

    async fn geocode(&self, address: &Address) -> Result<Option<GeocodeResult>, ProviderError> {
        let single_line = address.single_line();
        let params = [("address", single_line.as_str()), ("key", self.api_key.as_str())];

        let response: GeocodeResponse = self.get_json(GEOCODE_URL, &params).await?;
        check_status(&response.status)?;

        Ok(response.results.into_iter().next().map(|hit| GeocodeResult {
            latitude: hit.geometry.location.lat,
            longitude: hit.geometry.location.lng,
            formatted_address: hit.formatted_address,
        }))
    }

    async fn reverse_geocode_zip(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<String>, ProviderError> {
        let latlng = format!("{},{}", latitude, longitude);
        let params = [
            ("latlng", latlng.as_str()),
            ("result_type", "postal_code"),
            ("key", self.api_key.as_str()),
        ];

        let response: GeocodeResponse = self.get_json(GEOCODE_URL, &params).await?;
        check_status(&response.status)?;

        Ok(response.results.iter().find_map(|hit| {
            hit.address_components
                .iter()
                .find(|c| c.types.iter().any(|t| t == "postal_code"))
                .map(|c| c.long_name.clone())
        }))
    }
}
