use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, sqlx::FromRow, Validate)]
pub struct GeoPoint {
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude out of range"))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude out of range"))]
    pub lng: f64,
}

/// Which capability produced a report's coordinate.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "location_source", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LocationSource {
    Device,
    MapClick,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "crime_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CrimeCategory {
    VehicleTheft,
    IllegalRacing,
}

impl CrimeCategory {
    pub fn label(&self) -> &'static str {
        match self {
            CrimeCategory::VehicleTheft => "Pencurian Kendaraan Bermotor",
            CrimeCategory::IllegalRacing => "Balap Liar",
        }
    }

    pub fn requires_vehicle(&self) -> bool {
        matches!(self, CrimeCategory::VehicleTheft)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "vehicle_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    TwoWheeler,
    FourWheeler,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Default)]
#[sqlx(type_name = "road_severity", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RoadSeverity {
    #[default]
    Light,
    Medium,
    Severe,
}

impl RoadSeverity {
    pub fn label(&self) -> &'static str {
        match self {
            RoadSeverity::Light => "Ringan",
            RoadSeverity::Medium => "Sedang",
            RoadSeverity::Severe => "Berat",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Default)]
#[sqlx(type_name = "report_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    #[default]
    New,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CrimeReport {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub category: CrimeCategory,
    pub description: String,
    #[sqlx(flatten)]
    pub location: GeoPoint,
    pub location_source: LocationSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_name: Option<String>,
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_type: Option<VehicleType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plate_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RoadReport {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub description: String,
    pub severity: RoadSeverity,
    #[sqlx(flatten)]
    pub location: GeoPoint,
    pub location_source: LocationSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_name: Option<String>,
    pub status: ReportStatus,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Insert payload for `crime_reports`; id and timestamp are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCrimeReport {
    pub user_id: Uuid,
    pub user_name: String,
    pub category: CrimeCategory,
    pub description: String,
    pub location: GeoPoint,
    pub location_source: LocationSource,
    pub street_name: Option<String>,
    pub status: ReportStatus,
    pub vehicle_type: Option<VehicleType>,
    pub plate_number: Option<String>,
    pub brand: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRoadReport {
    pub user_id: Uuid,
    pub user_name: String,
    pub description: String,
    pub severity: RoadSeverity,
    pub location: GeoPoint,
    pub location_source: LocationSource,
    pub street_name: Option<String>,
    pub status: ReportStatus,
}
