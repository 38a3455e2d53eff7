//! Territory check and CRUD handlers.

use axum::extract::{Json, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use super::super::types::{
    AppState, ErrorResponse, SaveTerritoryResponse, TerritoryCheckRequest, TerritoryCheckResponse,
};
use crate::geocoding::MSG_TERRITORY_UNKNOWN;
use crate::territory::TerritoryDraft;

/// Header carrying the admin token for privileged routes.
const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Checks the admin token on privileged routes. When no token is configured
/// the routes are open (authorization is the deployment's responsibility);
/// that state is logged once at startup.
fn authorized(state: &AppState, headers: &HeaderMap) -> bool {
    match &state.admin_token {
        Some(expected) => headers
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(|token| token == expected.as_ref())
            .unwrap_or(false),
        None => true,
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new("Admin token required.")),
    )
        .into_response()
}

/// `POST /territory/check` - classify a point (or a geocoded address)
/// against the configured territories. 400 when neither coordinates nor an
/// address is supplied.
pub async fn check_handler(
    State(state): State<AppState>,
    Json(request): Json<TerritoryCheckRequest>,
) -> Response {
    let coordinates = match request.coordinates() {
        Some(coordinates) => Some(coordinates),
        None => match request.address() {
            Some(address) => state
                .geocoding
                .geocode_address(&address)
                .await
                .map(|g| g.coordinates()),
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse::new(
                        "Either coordinates or an address is required.",
                    )),
                )
                    .into_response();
            }
        },
    };

    let Some(coordinates) = coordinates else {
        // Address supplied but not geocodable: unknown, not denied
        return Json(TerritoryCheckResponse {
            success: false,
            in_territory: None,
            matching_territories: Vec::new(),
            latitude: None,
            longitude: None,
            message: Some(MSG_TERRITORY_UNKNOWN.to_string()),
        })
        .into_response();
    };

    let verdict = state
        .geocoding
        .territories()
        .check_service_territory(
            coordinates.latitude,
            coordinates.longitude,
            request.utility.as_deref(),
        )
        .await;

    Json(TerritoryCheckResponse {
        success: true,
        in_territory: Some(verdict.in_territory),
        matching_territories: verdict.matching_territories,
        latitude: Some(coordinates.latitude),
        longitude: Some(coordinates.longitude),
        message: None,
    })
    .into_response()
}

/// `GET /territories` (privileged) - the full territory collection.
pub async fn list_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    let territories = state.geocoding.territories().list_territories().await;
    Json(territories).into_response()
}

/// `POST /territory` (privileged) - upsert one territory, returns its id.
pub async fn save_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(draft): Json<TerritoryDraft>,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    let id = state.geocoding.territories().save_territory(draft).await;
    Json(SaveTerritoryResponse { id }).into_response()
}

/// `DELETE /territory/{id}` (privileged) - 404 when the id is unknown.
pub async fn delete_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    if state.geocoding.territories().delete_territory(&id).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Territory not found.")),
        )
            .into_response()
    }
}
