pub mod admin;
pub mod auth;
pub mod citizen;
pub mod dashboard;
pub mod geocode;
pub mod reports;
pub mod users;

use crate::{
    db::cache::CacheHelper,
    error::{ErrorMessage, HttpError},
    models::{reportmodel::GeoPoint, usermodel::UserProfile},
    service::{guard::SIGN_IN_PATH, map_feed::MapFeed, session::SessionContext},
    AppState,
};

/// The profile behind a session that already passed `role_check`.
pub(crate) fn session_user(session: &SessionContext) -> Result<&UserProfile, HttpError> {
    session.user().ok_or_else(|| {
        HttpError::unauthorized(ErrorMessage::UserNotAuthenticated.to_string())
            .with_redirect(SIGN_IN_PATH)
    })
}

pub(crate) fn map_feed(app_state: &AppState) -> MapFeed<'_> {
    MapFeed::new(
        app_state.db_client.as_ref(),
        app_state.cache.as_deref(),
        app_state.env.map_feed_cache_ttl,
    )
}

pub(crate) fn map_center(app_state: &AppState) -> GeoPoint {
    GeoPoint {
        lat: app_state.env.map_center_lat,
        lng: app_state.env.map_center_lng,
    }
}

pub(crate) async fn invalidate_map_feeds(app_state: &AppState) {
    if let Some(cache) = &app_state.cache {
        CacheHelper::invalidate_map_feeds(cache.as_ref()).await;
    }
}

pub(crate) fn query_failed(e: sqlx::Error) -> HttpError {
    tracing::error!("Query failed: {}", e);
    HttpError::server_error(ErrorMessage::ServerError.to_string())
}
