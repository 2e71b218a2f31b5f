use chrono::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Citizen,
    Police,
    PublicWorks,
    Admin,
}

impl UserRole {
    pub const ALL: [UserRole; 4] = [
        UserRole::Citizen,
        UserRole::Police,
        UserRole::PublicWorks,
        UserRole::Admin,
    ];

    pub fn to_str(&self) -> &str {
        match self {
            UserRole::Citizen => "citizen",
            UserRole::Police => "police",
            UserRole::PublicWorks => "public_works",
            UserRole::Admin => "admin",
        }
    }

    /// Landing view a signed-in user is sent to.
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            UserRole::Citizen => "/citizen-dashboard",
            UserRole::Police => "/police-dashboard",
            UserRole::PublicWorks => "/public-works-dashboard",
            UserRole::Admin => "/admin-dashboard",
        }
    }
}

/// Where a profile sits in the KYC review queue.
///
/// `Incomplete` profiles never reach the admin queue. Editing a profile in
/// any later state sends it back to `Pending`.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "verification_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Incomplete,
    Pending,
    Verified,
    Denied,
}

impl VerificationStatus {
    pub fn to_str(&self) -> &str {
        match self {
            VerificationStatus::Incomplete => "incomplete",
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Denied => "denied",
        }
    }
}

#[derive(Debug, Serialize, sqlx::FromRow, Clone, PartialEq)]
pub struct UserProfile {
    pub id: uuid::Uuid,
    pub name: String,
    pub email: String,

    #[serde(skip_serializing)]
    pub password: String,

    pub role: UserRole,
    pub email_verified: bool,

    #[serde(skip_serializing)]
    pub verification_token: Option<String>,
    #[serde(skip_serializing)]
    pub token_expires_at: Option<DateTime<Utc>>,

    pub verified: bool,
    pub verification_status: VerificationStatus,
    pub verified_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<uuid::Uuid>,

    #[serde(rename = "nama")]
    pub legal_name: Option<String>,
    #[serde(rename = "noKTP")]
    pub id_number: Option<String>,
    #[serde(rename = "alamat")]
    pub address: Option<String>,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

fn is_filled(field: &Option<String>) -> bool {
    field.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}

impl UserProfile {
    /// All mandatory KYC fields (legal name, ID number, address) are present.
    pub fn kyc_complete(&self) -> bool {
        is_filled(&self.legal_name) && is_filled(&self.id_number) && is_filled(&self.address)
    }

    /// Whether the report forms are open to this profile.
    pub fn can_report(&self) -> bool {
        self.role == UserRole::Citizen && self.verified && self.kyc_complete()
    }

    pub fn is_pending_review(&self) -> bool {
        !self.verified
            && self.verification_status == VerificationStatus::Pending
            && self.kyc_complete()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn blank_kyc_fields_do_not_count() {
        let mut user = pending_citizen();
        assert!(user.kyc_complete());

        user.address = Some("   ".to_string());
        assert!(!user.kyc_complete());
        assert!(!user.is_pending_review());
    }

    #[test]
    fn report_forms_need_complete_and_verified_citizen() {
        assert!(!profile(UserRole::Citizen).can_report());
        assert!(!pending_citizen().can_report());
        assert!(verified_citizen().can_report());

        let mut police = verified_citizen();
        police.role = UserRole::Police;
        assert!(!police.can_report());
    }

    #[test]
    fn every_role_has_a_dashboard() {
        let paths: Vec<_> = UserRole::ALL.iter().map(|r| r.dashboard_path()).collect();
        assert_eq!(
            paths,
            vec![
                "/citizen-dashboard",
                "/police-dashboard",
                "/public-works-dashboard",
                "/admin-dashboard"
            ]
        );
    }

    #[test]
    fn profile_json_uses_kyc_field_names_and_hides_secrets() {
        let user = pending_citizen();
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["nama"], "Budi Santoso");
        assert_eq!(json["noKTP"], "3578010101900001");
        assert_eq!(json["alamat"], "Jl. Darmo 12, Surabaya");
        assert_eq!(json["role"], "citizen");
        assert!(json.get("password").is_none());
        assert!(json.get("verification_token").is_none());
    }
}
