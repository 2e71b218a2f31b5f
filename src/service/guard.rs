use crate::error::{ErrorMessage, HttpError};
use crate::models::usermodel::UserRole;
use crate::service::session::SessionContext;

pub const SIGN_IN_PATH: &str = "/login";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session still resolving. Neither render nor redirect.
    Wait,
    RedirectSignIn,
    RedirectUnauthorized,
    Render,
}

pub struct RouteGuard;

impl RouteGuard {
    pub fn evaluate(session: &SessionContext, allowed: &[UserRole]) -> GuardDecision {
        if session.loading {
            return GuardDecision::Wait;
        }

        match session.role {
            None => GuardDecision::RedirectSignIn,
            Some(role) if allowed.contains(&role) => GuardDecision::Render,
            Some(_) => GuardDecision::RedirectUnauthorized,
        }
    }
}

impl GuardDecision {
    /// `Ok` only for `Render`; every other outcome becomes the matching error response.
    pub fn into_result(self) -> Result<(), HttpError> {
        match self {
            GuardDecision::Render => Ok(()),
            GuardDecision::Wait => Err(HttpError::new(
                ErrorMessage::SessionLoading.to_string(),
                axum::http::StatusCode::SERVICE_UNAVAILABLE,
            )),
            GuardDecision::RedirectSignIn => {
                Err(HttpError::unauthorized(ErrorMessage::UserNotAuthenticated.to_string())
                    .with_redirect(SIGN_IN_PATH))
            }
            GuardDecision::RedirectUnauthorized => {
                Err(HttpError::forbidden(ErrorMessage::PermissionDenied.to_string())
                    .with_redirect(UNAUTHORIZED_PATH))
            }
        }
    }
}
