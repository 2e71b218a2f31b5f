use std::sync::Arc;

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::IntoResponse,
    Extension,
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::{
    error::HttpError,
    models::usermodel::UserRole,
    service::{
        guard::RouteGuard,
        session::{SessionContext, SessionResolver},
    },
    utils::token,
    AppState,
};

fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|auth_header| auth_header.to_str().ok())
        .and_then(|auth_value| auth_value.strip_prefix("Bearer "))
        .map(str::to_owned)
}

/// Resolves the caller once and attaches the [`SessionContext`] to the
/// request. A missing or invalid token is a signed-out session, not an error;
/// `role_check` decides what that means for each route.
pub async fn auth(
    cookie_jar: CookieJar,
    Extension(app_state): Extension<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> impl IntoResponse {
    let identity = cookie_jar
        .get("token")
        .map(|cookie| cookie.value().to_string())
        .or_else(|| bearer_token(&req))
        .and_then(|token| match token::decode_token(token, app_state.env.jwt_secret.as_bytes()) {
            Ok(sub) => Uuid::parse_str(&sub).ok(),
            Err(_) => {
                tracing::debug!("Ignoring invalid session token");
                None
            }
        });

    let session = SessionResolver::new(app_state.db_client.as_ref())
        .resolve(identity)
        .await;

    req.extensions_mut().insert(session);
    next.run(req).await
}

pub async fn role_check(
    Extension(_app_state): Extension<Arc<AppState>>,
    req: Request,
    next: Next,
    required_roles: Vec<UserRole>,
) -> Result<impl IntoResponse, HttpError> {
    let session = req
        .extensions()
        .get::<SessionContext>()
        .cloned()
        .unwrap_or_else(SessionContext::signed_out);

    RouteGuard::evaluate(&session, &required_roles).into_result()?;

    Ok(next.run(req).await)
}
