// service/verification_service.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::db::Store;
use crate::dtos::{admindtos::ReviewDecision, userdtos::ProfileUpdateDto};
use crate::models::usermodel::{UserProfile, VerificationStatus};
use crate::service::error::ServiceError;

#[derive(Debug, Clone)]
pub enum ReviewOutcome {
    /// What the profile would look like; nothing was written.
    Preview(UserProfile),
    Applied(UserProfile),
}

impl ReviewDecision {
    pub fn target_status(&self) -> VerificationStatus {
        match self {
            ReviewDecision::Approve => VerificationStatus::Verified,
            ReviewDecision::Deny => VerificationStatus::Denied,
        }
    }
}

pub struct VerificationService {
    db_client: Arc<dyn Store>,
}

impl VerificationService {
    pub fn new(db_client: Arc<dyn Store>) -> Self {
        Self { db_client }
    }

    /// Profiles waiting for review, never including the reviewing admin.
    pub async fn pending_profiles(&self, admin_id: Uuid) -> Result<Vec<UserProfile>, ServiceError> {
        let profiles = self.db_client.get_pending_profiles(admin_id).await?;

        Ok(profiles
            .into_iter()
            .filter(|p| p.id != admin_id && p.is_pending_review())
            .collect())
    }

    pub async fn review(
        &self,
        admin_id: Uuid,
        user_id: Uuid,
        decision: ReviewDecision,
        confirm: bool,
    ) -> Result<ReviewOutcome, ServiceError> {
        if admin_id == user_id {
            return Err(ServiceError::SelfReview);
        }

        let target = self
            .db_client
            .get_user(Some(user_id), None, None)
            .await?
            .ok_or(ServiceError::ProfileNotFound(user_id))?;

        if target.verification_status != VerificationStatus::Pending {
            return Err(ServiceError::NotPending(user_id));
        }

        let status = decision.target_status();

        if !confirm {
            let mut preview = target;
            preview.verified = status == VerificationStatus::Verified;
            preview.verification_status = status;
            preview.verified_at = preview.verified.then(Utc::now);
            preview.reviewed_by = Some(admin_id);
            return Ok(ReviewOutcome::Preview(preview));
        }

        let updated = self
            .db_client
            .update_verification(user_id, admin_id, status)
            .await?
            .ok_or(ServiceError::NotPending(user_id))?;

        info!(
            "Profile {} marked {} by admin {}",
            user_id,
            status.to_str(),
            admin_id
        );
        Ok(ReviewOutcome::Applied(updated))
    }

    /// Saves the KYC fields. Any edit sends the profile back to review.
    pub async fn complete_profile(
        &self,
        user_id: Uuid,
        dto: &ProfileUpdateDto,
    ) -> Result<UserProfile, ServiceError> {
        let id_number: String = dto.id_number.chars().filter(|c| !c.is_whitespace()).collect();

        let updated = self
            .db_client
            .update_user_profile(
                user_id,
                dto.legal_name.trim(),
                &id_number,
                dto.address.trim(),
            )
            .await?;

        info!("Profile {} submitted for verification", user_id);
        Ok(updated)
    }
}
