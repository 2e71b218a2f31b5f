use serde::Serialize;
use uuid::Uuid;

use crate::db::Store;
use crate::models::usermodel::{UserProfile, UserRole};

/// Who is calling and what they may do, resolved once per request.
///
/// `loading` is only true for a context built with [`SessionContext::resolving`];
/// guards must never render or redirect on it.
#[derive(Debug, Clone, Serialize)]
pub struct SessionContext {
    pub identity: Option<Uuid>,
    pub role: Option<UserRole>,
    pub loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
}

impl SessionContext {
    pub fn signed_out() -> Self {
        SessionContext {
            identity: None,
            role: None,
            loading: false,
            profile: None,
        }
    }

    pub fn resolving(identity: Uuid) -> Self {
        SessionContext {
            identity: Some(identity),
            role: None,
            loading: true,
            profile: None,
        }
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    /// Where the client should land: the role dashboard, or the sign-in page.
    pub fn landing_path(&self) -> &'static str {
        self.role.map(|r| r.dashboard_path()).unwrap_or("/login")
    }
}

pub struct SessionResolver<'a> {
    store: &'a dyn Store,
}

impl<'a> SessionResolver<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        SessionResolver { store }
    }

    /// Issues exactly one profile read for a signed-in identity. A missing
    /// profile or a failed lookup resolves to no role.
    pub async fn resolve(&self, identity: Option<Uuid>) -> SessionContext {
        let Some(user_id) = identity else {
            return SessionContext::signed_out();
        };

        let profile = match self.store.get_user(Some(user_id), None, None).await {
            Ok(Some(profile)) => Some(profile),
            Ok(None) => {
                tracing::warn!("No profile for signed-in identity {}", user_id);
                None
            }
            Err(e) => {
                tracing::error!("Failed to load profile for {}: {}", user_id, e);
                None
            }
        };

        SessionContext {
            identity: Some(user_id),
            role: profile.as_ref().map(|p| p.role),
            loading: false,
            profile,
        }
    }
}
