use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::{
    reportmodel::{CrimeCategory, CrimeReport, GeoPoint, LocationSource, RoadReport, RoadSeverity, VehicleType},
    stationmodel::PoliceStation,
};
use crate::service::map_feed::MapMarker;

/// Crime report form as the client holds it until submission.
#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrimeReportDraft {
    pub category: CrimeCategory,
    #[validate(length(max = 2000, message = "Deskripsi terlalu panjang"))]
    pub description: Option<String>,
    pub vehicle_type: Option<VehicleType>,
    #[validate(length(max = 20, message = "Nomor plat terlalu panjang"))]
    pub plate_number: Option<String>,
    #[validate(length(max = 100))]
    pub brand: Option<String>,
    #[validate(length(max = 50))]
    pub color: Option<String>,
    #[validate]
    pub location: Option<GeoPoint>,
    pub location_source: Option<LocationSource>,
    /// Filled by the client's own reverse-geocode call when it finished in time.
    pub street_name: Option<String>,
}

impl CrimeReportDraft {
    /// Submission is gated on the location alone.
    pub fn can_submit(&self) -> bool {
        self.location.is_some()
    }
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadReportDraft {
    #[validate(
        custom = "validate_description",
        length(max = 2000, message = "Deskripsi terlalu panjang")
    )]
    pub description: String,
    #[serde(default)]
    pub severity: RoadSeverity,
    #[validate]
    pub location: Option<GeoPoint>,
    pub location_source: Option<LocationSource>,
    pub street_name: Option<String>,
}

fn validate_description(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some(Cow::from("Deskripsi wajib diisi"));
        return Err(error);
    }
    Ok(())
}

impl RoadReportDraft {
    pub fn can_submit(&self) -> bool {
        self.location.is_some()
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct PageQueryDto {
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
    pub after: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ReverseGeocodeQueryDto {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreetNameDto {
    pub street_name: String,
}

#[derive(Debug, Serialize)]
pub struct ReportResponseDto<T> {
    pub status: &'static str,
    pub message: String,
    pub data: T,
}

/// Everything a dashboard map renders: the raw collections it is allowed to
/// see plus one marker per record.
#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MapViewDto {
    pub status: &'static str,
    pub center: Option<GeoPoint>,
    pub markers: Vec<MapMarker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crime_reports: Option<Vec<CrimeReport>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub road_reports: Option<Vec<RoadReport>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stations: Option<Vec<PoliceStation>>,
}
