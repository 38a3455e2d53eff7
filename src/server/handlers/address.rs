//! Address validation, autocomplete, and geocoding handlers.

use axum::extract::{Json, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::super::types::{
    AddressPayload, AutocompleteParams, ErrorResponse, GeocodeResponse, PlaceDetailsParams,
    PredictionsResponse, AppState,
};
use crate::address::Address;

/// `GET /address/autocomplete?input=&session_token=`
pub async fn autocomplete_handler(
    State(state): State<AppState>,
    Query(params): Query<AutocompleteParams>,
) -> Response {
    let predictions = state
        .validation
        .get_autocomplete_predictions(&params.input, params.session_token.as_deref())
        .await;
    Json(PredictionsResponse { predictions }).into_response()
}

/// `POST /address/validate` - full `ValidationResult` JSON, always 200.
pub async fn validate_handler(
    State(state): State<AppState>,
    Json(payload): Json<AddressPayload>,
) -> Response {
    let address: Address = payload.into();
    let result = state.validation.validate_address(&address).await;
    Json(result).into_response()
}

/// `GET /address/place-details?place_id=&session_token=` - 404 when the
/// place cannot be resolved (or the provider has no place-id concept).
pub async fn place_details_handler(
    State(state): State<AppState>,
    Query(params): Query<PlaceDetailsParams>,
) -> Response {
    match state
        .validation
        .get_place_details(&params.place_id, params.session_token.as_deref())
        .await
    {
        Some(address) => Json(address).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Place not found.")),
        )
            .into_response(),
    }
}

/// `POST /geocode` - coordinates for an address, 404 when geocoding fails.
pub async fn geocode_handler(
    State(state): State<AppState>,
    Json(payload): Json<AddressPayload>,
) -> Response {
    let address: Address = payload.into();
    match state.geocoding.geocode_address(&address).await {
        Some(result) => Json(GeocodeResponse {
            success: true,
            latitude: result.latitude,
            longitude: result.longitude,
            formatted_address: result.formatted_address,
        })
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Unable to geocode address.")),
        )
            .into_response(),
    }
}
