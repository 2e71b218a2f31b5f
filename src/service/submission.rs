use std::time::Duration;

use validator::Validate;

use crate::db::Store;
use crate::dtos::reportdtos::{CrimeReportDraft, RoadReportDraft};
use crate::models::{
    reportmodel::{
        CrimeReport, GeoPoint, LocationSource, NewCrimeReport, NewRoadReport, ReportStatus,
        RoadReport, VehicleType,
    },
    usermodel::{UserProfile, UserRole},
};
use crate::service::{
    error::ServiceError,
    geocoding::{resolve_street_name, ReverseGeocoder},
};

/// Citizens may file reports once their profile is complete and verified.
pub fn ensure_can_report(reporter: &UserProfile) -> Result<(), ServiceError> {
    if reporter.role != UserRole::Citizen {
        return Err(ServiceError::NotACitizen);
    }
    if !reporter.kyc_complete() {
        return Err(ServiceError::ProfileIncomplete);
    }
    if !reporter.verified {
        return Err(ServiceError::ProfileNotVerified);
    }
    Ok(())
}

fn required_text(value: Option<String>, field: &'static str) -> Result<String, ServiceError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ServiceError::MissingVehicleDetails(field))
}

/// Plates are stored uppercased; the column holds at most 20 characters.
const MAX_PLATE_LEN: usize = 20;

fn plate_number(value: Option<String>) -> Result<String, ServiceError> {
    let plate = required_text(value, "nomor plat")?.to_uppercase();
    let valid = plate.len() <= MAX_PLATE_LEN
        && plate.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ');
    if !valid {
        return Err(ServiceError::Validation(
            "Nomor plat hanya boleh berisi huruf, angka, dan spasi (maks. 20 karakter)".to_string(),
        ));
    }
    Ok(plate)
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

struct VehicleDetails {
    vehicle_type: VehicleType,
    plate_number: String,
    brand: String,
    color: String,
}

pub struct ReportSubmission<'a> {
    store: &'a dyn Store,
    geocoder: &'a dyn ReverseGeocoder,
    geocode_deadline: Duration,
}

impl<'a> ReportSubmission<'a> {
    pub fn new(
        store: &'a dyn Store,
        geocoder: &'a dyn ReverseGeocoder,
        geocode_deadline: Duration,
    ) -> Self {
        ReportSubmission {
            store,
            geocoder,
            geocode_deadline,
        }
    }

    async fn street_name(&self, client_value: Option<String>, location: GeoPoint) -> String {
        match optional_text(client_value) {
            Some(name) => name,
            None => resolve_street_name(self.geocoder, location, self.geocode_deadline).await,
        }
    }

    /// Inserts a new crime report. Every call creates a new record.
    pub async fn submit_crime(
        &self,
        reporter: &UserProfile,
        draft: CrimeReportDraft,
    ) -> Result<CrimeReport, ServiceError> {
        ensure_can_report(reporter)?;
        draft.validate()?;

        let location = draft.location.ok_or(ServiceError::LocationRequired)?;

        let vehicle = if draft.category.requires_vehicle() {
            Some(VehicleDetails {
                vehicle_type: draft
                    .vehicle_type
                    .ok_or(ServiceError::MissingVehicleDetails("jenis kendaraan"))?,
                plate_number: plate_number(draft.plate_number)?,
                brand: required_text(draft.brand, "merek")?,
                color: required_text(draft.color, "warna")?,
            })
        } else {
            None
        };

        let description = optional_text(draft.description)
            .unwrap_or_else(|| draft.category.label().to_string());
        let street_name = self.street_name(draft.street_name, location).await;

        let report = NewCrimeReport {
            user_id: reporter.id,
            user_name: reporter.name.clone(),
            category: draft.category,
            description,
            location,
            location_source: draft.location_source.unwrap_or(LocationSource::Device),
            street_name: Some(street_name),
            status: ReportStatus::New,
            vehicle_type: vehicle.as_ref().map(|v| v.vehicle_type),
            plate_number: vehicle.as_ref().map(|v| v.plate_number.clone()),
            brand: vehicle.as_ref().map(|v| v.brand.clone()),
            color: vehicle.map(|v| v.color),
        };

        let saved = self.store.save_crime_report(&report).await?;
        tracing::info!(
            "Crime report {} ({}) filed by {}",
            saved.id,
            saved.category.label(),
            reporter.id
        );
        Ok(saved)
    }

    pub async fn submit_road(
        &self,
        reporter: &UserProfile,
        draft: RoadReportDraft,
    ) -> Result<RoadReport, ServiceError> {
        ensure_can_report(reporter)?;
        draft.validate()?;

        let location = draft.location.ok_or(ServiceError::LocationRequired)?;
        let street_name = self.street_name(draft.street_name, location).await;

        let report = NewRoadReport {
            user_id: reporter.id,
            user_name: reporter.name.clone(),
            description: draft.description.trim().to_string(),
            severity: draft.severity,
            location,
            location_source: draft.location_source.unwrap_or(LocationSource::Device),
            street_name: Some(street_name),
            status: ReportStatus::New,
        };

        let saved = self.store.save_road_report(&report).await?;
        tracing::info!("Road report {} filed by {}", saved.id, reporter.id);
        Ok(saved)
    }
}
