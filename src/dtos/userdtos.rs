use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::usermodel::{UserProfile, UserRole, VerificationStatus};

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterUserDto {
    #[validate(length(min = 1, max = 100, message = "Nama wajib diisi"))]
    pub name: String,

    #[validate(
        length(min = 1, message = "Email wajib diisi"),
        email(message = "Format email tidak valid")
    )]
    pub email: String,

    #[validate(
        length(min = 1, message = "Password wajib diisi"),
        length(min = 6, message = "Password minimal 6 karakter")
    )]
    pub password: String,

    #[validate(
        length(min = 1, message = "Konfirmasi password wajib diisi"),
        must_match(other = "password", message = "Password tidak sama")
    )]
    #[serde(rename = "passwordConfirm")]
    pub password_confirm: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[validate(
        length(min = 1, message = "Email wajib diisi"),
        email(message = "Format email tidak valid")
    )]
    pub email: String,
    #[validate(length(min = 1, message = "Password wajib diisi"))]
    pub password: String,
}

#[derive(Serialize, Deserialize, Validate)]
pub struct RequestQueryDto {
    #[validate(range(min = 1))]
    pub page: Option<usize>,
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<usize>,
}

#[derive(Serialize, Deserialize, Validate)]
pub struct VerifyEmailQueryDto {
    #[validate(length(min = 1, message = "Token wajib diisi"))]
    pub token: String,
}

/// KYC form. Field names follow the stored profile (`nama`, `noKTP`, `alamat`).
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct ProfileUpdateDto {
    #[validate(custom = "validate_not_blank")]
    #[serde(rename = "nama")]
    pub legal_name: String,

    #[validate(custom = "validate_id_number")]
    #[serde(rename = "noKTP")]
    pub id_number: String,

    #[validate(custom = "validate_not_blank")]
    #[serde(rename = "alamat")]
    pub address: String,
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some(Cow::from("Mohon lengkapi semua field."));
        return Err(error);
    }
    Ok(())
}

/// NIK: sixteen digits, spaces allowed between groups.
fn validate_id_number(value: &str) -> Result<(), ValidationError> {
    validate_not_blank(value)?;

    let nik_regex =
        regex::Regex::new(r"^[0-9]{16}$").map_err(|_| ValidationError::new("Invalid NIK regex"))?;
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();

    if !nik_regex.is_match(&compact) {
        let mut error = ValidationError::new("invalid_nik");
        error.message = Some(Cow::from("Nomor KTP harus 16 digit"));
        return Err(error);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RoleUpdateDto {
    #[validate(custom = "validate_assignable_role")]
    pub role: UserRole,
    pub target_user_id: Uuid,
}

fn validate_assignable_role(role: &UserRole) -> Result<(), ValidationError> {
    match role {
        UserRole::Citizen | UserRole::Police | UserRole::PublicWorks => Ok(()),
        UserRole::Admin => Err(ValidationError::new("invalid_role")),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilterUserDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub verified: bool,
    pub verification_status: String,
    pub email_verified: bool,
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

impl FilterUserDto {
    pub fn filter_user(user: &UserProfile) -> Self {
        FilterUserDto {
            id: user.id.to_string(),
            name: user.name.to_owned(),
            email: user.email.to_owned(),
            role: user.role.to_str().to_string(),
            verified: user.verified,
            verification_status: user.verification_status.to_str().to_string(),
            email_verified: user.email_verified,
            legal_name: user.legal_name.clone(),
            id_number: user.id_number.clone(),
            address: user.address.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }

    pub fn filter_users(users: &[UserProfile]) -> Vec<FilterUserDto> {
        users.iter().map(FilterUserDto::filter_user).collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserData {
    pub user: FilterUserDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponseDto {
    pub status: String,
    pub data: UserData,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserListResponseDto {
    pub status: String,
    pub users: Vec<FilterUserDto>,
    pub results: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserLoginResponseDto {
    pub status: String,
    pub token: String,
    /// Dashboard for the signed-in role.
    pub redirect: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponseDto {
    pub status: &'static str,
    pub signed_in: bool,
    pub loading: bool,
    pub role: Option<UserRole>,
    pub landing: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<FilterUserDto>,
}

/// Why the report forms are or are not open for the caller.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormStatusDto {
    pub can_report: bool,
    pub profile_complete: bool,
    pub verified: bool,
    pub verification_status: VerificationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct Response {
    pub status: &'static str,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_form_rejects_blank_fields() {
        let dto = ProfileUpdateDto {
            legal_name: "  ".to_string(),
            id_number: "3578010101900001".to_string(),
            address: "Jl. Darmo 12".to_string(),
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn nik_must_be_sixteen_digits() {
        let mut dto = ProfileUpdateDto {
            legal_name: "Budi".to_string(),
            id_number: "3578 0101 0190 0001".to_string(),
            address: "Jl. Darmo 12".to_string(),
        };
        assert!(dto.validate().is_ok());

        dto.id_number = "12345".to_string();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn profile_form_uses_kyc_field_names() {
        let dto: ProfileUpdateDto = serde_json::from_value(serde_json::json!({
            "nama": "Budi Santoso",
            "noKTP": "3578010101900001",
            "alamat": "Jl. Darmo 12"
        }))
        .unwrap();
        assert_eq!(dto.legal_name, "Budi Santoso");
    }

    #[test]
    fn admin_role_cannot_be_assigned() {
        let dto = RoleUpdateDto {
            role: UserRole::Admin,
            target_user_id: Uuid::new_v4(),
        };
        assert!(dto.validate().is_err());

        let dto = RoleUpdateDto {
            role: UserRole::PublicWorks,
            target_user_id: Uuid::new_v4(),
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn register_requires_matching_passwords() {
        let dto = RegisterUserDto {
            name: "Budi".to_string(),
            email: "budi@example.com".to_string(),
            password: "rahasia123".to_string(),
            password_confirm: "rahasia124".to_string(),
        };
        assert!(dto.validate().is_err());
    }
}
