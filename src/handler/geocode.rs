use std::{sync::Arc, time::Duration};

use axum::{extract::Query, middleware, response::IntoResponse, routing::get, Extension, Json, Router};
use validator::Validate;

use crate::{
    dtos::reportdtos::{ReverseGeocodeQueryDto, StreetNameDto},
    error::HttpError,
    middleware::main_middleware::role_check,
    models::{reportmodel::GeoPoint, usermodel::UserRole},
    service::geocoding::resolve_street_name,
    AppState,
};

pub fn geocode_handler() -> Router {
    Router::new().route(
        "/reverse",
        get(reverse_geocode).layer(middleware::from_fn(|state, req, next| {
            role_check(state, req, next, UserRole::ALL.to_vec())
        })),
    )
}

/// Best-effort street name for a picked coordinate. Always answers, with the
/// placeholder when the geocoder is slow or down.
pub async fn reverse_geocode(
    Query(query): Query<ReverseGeocodeQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    query
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let street_name = resolve_street_name(
        app_state.geocoder.as_ref(),
        GeoPoint {
            lat: query.lat,
            lng: query.lng,
        },
        Duration::from_millis(app_state.env.geocode_timeout_ms),
    )
    .await;

    Ok(Json(StreetNameDto { street_name }))
}
