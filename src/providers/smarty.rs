//! SmartyStreets adapter.
//!
//! Uses the us-street API for validation (the same call doubles as the
//! geocoder via candidate metadata) and us-autocomplete-pro for suggestions.
//! SmartyStreets has no place-id concept, so predictions carry no place id
//! and place details always resolve to nothing.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use super::{
    AddressProvider, ISSUE_NOT_FOUND, ISSUE_SECONDARY_INCORRECT, ISSUE_SECONDARY_MISSING,
};
use crate::address::{Address, Coordinates, GeocodeResult, Prediction, ValidationResult};
use crate::config::MAX_SUGGESTION_CANDIDATES;
use crate::error_handling::ProviderError;

const STREET_URL: &str = "https://us-street.api.smarty.com/street-address";
const AUTOCOMPLETE_URL: &str = "https://us-autocomplete-pro.api.smarty.com/lookup";

/// SmartyStreets adapter.
pub struct SmartyStreetsProvider {
    client: Arc<reqwest::Client>,
    auth_id: String,
    auth_token: String,
}

impl SmartyStreetsProvider {
    /// Creates an adapter using `client` and the given auth credential pair.
    pub fn new(client: Arc<reqwest::Client>, auth_id: String, auth_token: String) -> Self {
        SmartyStreetsProvider {
            client,
            auth_id,
            auth_token,
        }
    }

    async fn lookup_candidates(
        &self,
        address: &Address,
    ) -> Result<Vec<SmartyCandidate>, ProviderError> {
        let candidates = MAX_SUGGESTION_CANDIDATES.to_string();
        let mut params = vec![
            ("auth-id", self.auth_id.as_str()),
            ("auth-token", self.auth_token.as_str()),
            ("street", address.street.as_str()),
            ("city", address.city.as_str()),
            ("state", address.state.as_str()),
            ("zipcode", address.zip.as_str()),
            ("candidates", candidates.as_str()),
        ];
        if let Some(street2) = address.street2.as_deref() {
            params.push(("secondary", street2));
        }

        let response = self.client.get(STREET_URL).query(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                provider: "smarty",
                status: status.as_u16(),
            });
        }
        response
            .json::<Vec<SmartyCandidate>>()
            .await
            .map_err(|e| ProviderError::Decode {
                provider: "smarty",
                detail: e.to_string(),
            })
    }
}

#[derive(Debug, Deserialize)]
struct SmartyCandidate {
    #[serde(default)]
    delivery_line_1: Option<String>,
    #[serde(default)]
    delivery_line_2: Option<String>,
    #[serde(default)]
    last_line: Option<String>,
    #[serde(default)]
    components: SmartyComponents,
    #[serde(default)]
    metadata: SmartyMetadata,
    #[serde(default)]
    analysis: SmartyAnalysis,
}

#[derive(Debug, Default, Deserialize)]
struct SmartyComponents {
    #[serde(default)]
    city_name: Option<String>,
    #[serde(default)]
    state_abbreviation: Option<String>,
    #[serde(default)]
    zipcode: Option<String>,
    #[serde(default)]
    plus4_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SmartyMetadata {
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    carrier_route: Option<String>,
    #[serde(default)]
    precision: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SmartyAnalysis {
    #[serde(default)]
    dpv_match_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SmartyAutocompleteResponse {
    #[serde(default)]
    suggestions: Vec<SmartySuggestion>,
}

#[derive(Debug, Deserialize)]
struct SmartySuggestion {
    #[serde(default)]
    street_line: String,
    #[serde(default)]
    secondary: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    zipcode: String,
}

fn address_from_candidate(candidate: &SmartyCandidate) -> Address {
    let zip = match (&candidate.components.zipcode, &candidate.components.plus4_code) {
        (Some(zip), Some(plus4)) if !plus4.is_empty() => format!("{}-{}", zip, plus4),
        (Some(zip), _) => zip.clone(),
        (None, _) => String::new(),
    };
    Address {
        street: candidate.delivery_line_1.clone().unwrap_or_default(),
        street2: candidate.delivery_line_2.clone().filter(|l| !l.is_empty()),
        city: candidate.components.city_name.clone().unwrap_or_default(),
        state: candidate
            .components
            .state_abbreviation
            .clone()
            .unwrap_or_default(),
        zip,
    }
}

/// Maps street-API candidates onto a validation result for `address`.
///
/// Valid only when the DPV match code is Y, S, or D; S and D additionally
/// carry the same secondary-address issues as USPS.
fn validation_from_candidates(
    address: &Address,
    candidates: &[SmartyCandidate],
) -> ValidationResult {
    let Some(first) = candidates.first() else {
        let mut result = ValidationResult::passthrough(address);
        result.valid = false;
        result.issues.push(ISSUE_NOT_FOUND.to_string());
        return result;
    };

    let dpv = first.analysis.dpv_match_code.clone();
    let valid = matches!(dpv.as_deref(), Some("Y") | Some("S") | Some("D"));
    let mut issues = Vec::new();
    match dpv.as_deref() {
        Some("S") => issues.push(ISSUE_SECONDARY_MISSING.to_string()),
        Some("D") => issues.push(ISSUE_SECONDARY_INCORRECT.to_string()),
        Some("N") => issues.push(ISSUE_NOT_FOUND.to_string()),
        _ => {}
    }

    let standardized = address_from_candidate(first);
    let coordinates = match (first.metadata.latitude, first.metadata.longitude) {
        (Some(latitude), Some(longitude)) => Some(Coordinates {
            latitude,
            longitude,
        }),
        _ => None,
    };

    ValidationResult {
        valid,
        standardized: if standardized.is_empty() {
            address.clone()
        } else {
            standardized
        },
        issues,
        suggestions: candidates.iter().skip(1).map(address_from_candidate).collect(),
        coordinates,
        dpv_confirmation: dpv,
        carrier_route: first.metadata.carrier_route.clone(),
        location_precision: first.metadata.precision.clone(),
    }
}

#[async_trait]
impl AddressProvider for SmartyStreetsProvider {
    fn name(&self) -> &'static str {
        "smarty"
    }

    async fn autocomplete(
        &self,
        input: &str,
        _session_token: Option<&str>,
    ) -> Result<Vec<Prediction>, ProviderError> {
        let params = [
            ("auth-id", self.auth_id.as_str()),
            ("auth-token", self.auth_token.as_str()),
            ("search", input),
        ];

        let response = self
            .client
            .get(AUTOCOMPLETE_URL)
            .query(&params)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                provider: "smarty",
                status: status.as_u16(),
            });
        }
        let parsed: SmartyAutocompleteResponse =
            response.json().await.map_err(|e| ProviderError::Decode {
                provider: "smarty",
                detail: e.to_string(),
            })?;

        Ok(parsed
            .suggestions
            .into_iter()
            .map(|s| {
                let secondary_text = format!("{}, {} {}", s.city, s.state, s.zipcode);
                let main_text = if s.secondary.is_empty() {
                    s.street_line.clone()
                } else {
                    format!("{} {}", s.street_line, s.secondary)
                };
                Prediction {
                    place_id: None,
                    description: format!("{}, {}", main_text, secondary_text),
                    main_text,
                    secondary_text,
                }
            })
            .collect())
    }

    async fn validate(&self, address: &Address) -> Result<ValidationResult, ProviderError> {
        let candidates = self.lookup_candidates(address).await?;
        Ok(validation_from_candidates(address, &candidates))
    }

    async fn geocode(&self, address: &Address) -> Result<Option<GeocodeResult>, ProviderError> {
        let candidates = self.lookup_candidates(address).await?;
        let Some(first) = candidates.first() else {
            return Ok(None);
        };
        let (Some(latitude), Some(longitude)) =
            (first.metadata.latitude, first.metadata.longitude)
        else {
            return Ok(None);
        };

        let formatted_address = match (&first.delivery_line_1, &first.last_line) {
            (Some(line1), Some(last)) => Some(format!("{}, {}", line1, last)),
            (Some(line1), None) => Some(line1.clone()),
            _ => None,
        };
        Ok(Some(GeocodeResult {
            latitude,
            longitude,
            formatted_address,
        }))
    }
}
