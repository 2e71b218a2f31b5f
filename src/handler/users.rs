use axum::{response::IntoResponse, routing::get, Extension, Json, Router};

use crate::{
    dtos::userdtos::{FilterUserDto, SessionResponseDto},
    error::HttpError,
    service::session::SessionContext,
};

pub fn users_handler() -> Router {
    Router::new().route("/session", get(get_session))
}

/// The caller's resolved session and where the client should land.
pub async fn get_session(
    Extension(session): Extension<SessionContext>,
) -> Result<impl IntoResponse, HttpError> {
    Ok(Json(SessionResponseDto {
        status: "success",
        signed_in: session.role.is_some(),
        loading: session.loading,
        role: session.role,
        landing: session.landing_path(),
        user: session.user().map(FilterUserDto::filter_user),
    }))
}
