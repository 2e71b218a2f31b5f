use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::dtos::userdtos::FilterUserDto;
use crate::models::reportmodel::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Deny,
}

/// Approve/deny request. Without `confirm: true` nothing is written and the
/// response is a preview of the change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewVerificationDto {
    pub decision: ReviewDecision,
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponseDto {
    pub status: &'static str,
    pub applied: bool,
    pub message: String,
    pub user: FilterUserDto,
}

#[derive(Debug, Serialize)]
pub struct PendingProfilesResponseDto {
    pub status: &'static str,
    pub users: Vec<FilterUserDto>,
    pub results: usize,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreateStationDto {
    #[validate(length(min = 1, max = 255, message = "Nama kantor polisi wajib diisi"))]
    pub name: String,
    #[validate(length(min = 1, message = "Alamat wajib diisi"))]
    pub address: String,
    #[validate]
    pub location: GeoPoint,
}
