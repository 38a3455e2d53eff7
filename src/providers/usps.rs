//! USPS Web Tools adapter.
//!
//! USPS only verifies addresses (no autocomplete, no geocoding). The Verify
//! API speaks XML over a GET query parameter; the handful of response tags
//! we need are extracted with regexes rather than a full XML parser. Note
//! the USPS field swap: `Address1` is the secondary line and `Address2` is
//! the street.

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;

use super::{
    AddressProvider, ISSUE_NOT_FOUND, ISSUE_SECONDARY_INCORRECT, ISSUE_SECONDARY_MISSING,
};
use crate::address::{Address, ValidationResult};
use crate::error_handling::ProviderError;

const VERIFY_URL: &str = "https://secure.shippingapis.com/ShippingAPI.dll";

/// USPS Web Tools adapter.
pub struct UspsProvider {
    client: Arc<reqwest::Client>,
    user_id: String,
}

impl UspsProvider {
    /// Creates an adapter using `client` and the given Web Tools user id.
    pub fn new(client: Arc<reqwest::Client>, user_id: String) -> Self {
        UspsProvider { client, user_id }
    }

    fn build_request_xml(&self, address: &Address) -> String {
        let (zip5, zip4) = split_zip(&address.zip);
        format!(
            "<AddressValidateRequest USERID=\"{}\"><Revision>1</Revision>\
             <Address ID=\"0\">\
             <Address1>{}</Address1>\
             <Address2>{}</Address2>\
             <City>{}</City>\
             <State>{}</State>\
             <Zip5>{}</Zip5>\
             <Zip4>{}</Zip4>\
             </Address></AddressValidateRequest>",
            escape_xml(&self.user_id),
            escape_xml(address.street2.as_deref().unwrap_or("")),
            escape_xml(&address.street),
            escape_xml(&address.city),
            escape_xml(&address.state),
            escape_xml(&zip5),
            escape_xml(&zip4),
        )
    }
}

fn split_zip(zip: &str) -> (String, String) {
    match zip.split_once('-') {
        Some((zip5, zip4)) => (zip5.to_string(), zip4.to_string()),
        None => (zip.to_string(), String::new()),
    }
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn unescape_xml(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Extracts the text of the first `<tag>...</tag>` occurrence.
fn xml_tag(body: &str, tag: &str) -> Option<String> {
    let pattern = Regex::new(&format!("<{0}>([^<]*)</{0}>", tag)).ok()?;
    pattern
        .captures(body)
        .map(|caps| unescape_xml(caps[1].trim()))
        .filter(|text| !text.is_empty())
}

/// Maps a Verify response body onto a validation result for `address`.
///
/// An `<Error>` outside any `<AddressValidateResponse>` is an authorization
/// or request failure and counts against the circuit; an `<Error>` inside
/// the response (e.g. "Address Not Found") is a business rejection.
fn validation_from_response(
    address: &Address,
    body: &str,
) -> Result<ValidationResult, ProviderError> {
    let is_validate_response = body.contains("<AddressValidateResponse");
    if let Some(description) = xml_tag(body, "Description") {
        if !is_validate_response {
            return Err(ProviderError::Upstream {
                provider: "usps",
                status: description,
            });
        }
        let mut result = ValidationResult::passthrough(address);
        result.valid = false;
        result.issues.push(description);
        return Ok(result);
    }
    if !is_validate_response {
        return Err(ProviderError::Decode {
            provider: "usps",
            detail: "response contained no AddressValidateResponse element".to_string(),
        });
    }

    let street = xml_tag(body, "Address2");
    let Some(street) = street else {
        // No usable address payload came back
        let mut result = ValidationResult::passthrough(address);
        result.valid = false;
        result.issues.push(ISSUE_NOT_FOUND.to_string());
        return Ok(result);
    };

    let zip5 = xml_tag(body, "Zip5").unwrap_or_default();
    let zip = match xml_tag(body, "Zip4") {
        Some(zip4) if !zip5.is_empty() => format!("{}-{}", zip5, zip4),
        _ => zip5,
    };
    let standardized = Address {
        street,
        street2: xml_tag(body, "Address1"),
        city: xml_tag(body, "City").unwrap_or_default(),
        state: xml_tag(body, "State").unwrap_or_default(),
        zip,
    };

    let dpv_confirmation = xml_tag(body, "DPVConfirmation");
    let mut issues = Vec::new();
    match dpv_confirmation.as_deref() {
        Some("N") => issues.push(ISSUE_NOT_FOUND.to_string()),
        Some("S") => issues.push(ISSUE_SECONDARY_MISSING.to_string()),
        Some("D") => issues.push(ISSUE_SECONDARY_INCORRECT.to_string()),
        _ => {}
    }

    Ok(ValidationResult {
        valid: true,
        standardized,
        issues,
        suggestions: Vec::new(),
        coordinates: None,
        dpv_confirmation,
        carrier_route: xml_tag(body, "CarrierRoute"),
        location_precision: None,
    })
}

#[async_trait]
impl AddressProvider for UspsProvider {
    fn name(&self) -> &'static str {
        "usps"
    }

    async fn validate(&self, address: &Address) -> Result<ValidationResult, ProviderError> {
        let xml = self.build_request_xml(address);
        let response = self
            .client
            .get(VERIFY_URL)
            .query(&[("API", "Verify"), ("XML", xml.as_str())])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                provider: "usps",
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        validation_from_response(address, &body)
    }
}
