//! In-process `Store` for unit and router tests.
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Mutex,
};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::error::{DatabaseError, ErrorKind};
use uuid::Uuid;

use super::{cache::FeedCache, reportdb::ReportExt, stationdb::StationExt, userdb::UserExt};
use crate::models::{
    cursor::ReportCursor,
    reportmodel::{CrimeReport, GeoPoint, NewCrimeReport, NewRoadReport, RoadReport},
    stationmodel::PoliceStation,
    usermodel::{UserProfile, UserRole, VerificationStatus},
};

#[derive(Default)]
pub struct MemoryStore {
    pub users: Mutex<Vec<UserProfile>>,
    pub crime_reports: Mutex<Vec<CrimeReport>>,
    pub road_reports: Mutex<Vec<RoadReport>>,
    pub stations: Mutex<Vec<PoliceStation>>,
    /// Fails every report read when set.
    pub fail_reports: AtomicBool,
    /// Fails every profile lookup when set.
    pub fail_profiles: AtomicBool,
    pub page_delay: Mutex<Option<Duration>>,
    pub page_calls: AtomicUsize,
    pub profile_reads: AtomicUsize,
}

fn injected() -> sqlx::Error {
    sqlx::Error::Protocol("injected failure".to_string())
}

/// What Postgres reports when an insert hits a UNIQUE index.
#[derive(Debug, thiserror::Error)]
#[error("duplicate key value violates unique constraint \"users_email_key\"")]
pub struct UniqueViolation;

impl DatabaseError for UniqueViolation {
    fn message(&self) -> &str {
        "duplicate key value violates unique constraint \"users_email_key\""
    }

    fn constraint(&self) -> Option<&str> {
        Some("users_email_key")
    }

    fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self
    }

    fn kind(&self) -> ErrorKind {
        ErrorKind::UniqueViolation
    }
}

pub fn unique_violation() -> sqlx::Error {
    sqlx::Error::Database(Box::new(UniqueViolation))
}

/// Newest first, id as the tiebreak.
fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, Uuid)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: Vec<UserProfile>) -> Self {
        let store = Self::default();
        *store.users.lock().unwrap() = users;
        store
    }

    pub fn set_page_delay(&self, delay: Duration) {
        *self.page_delay.lock().unwrap() = Some(delay);
    }

    pub fn fail_reports(&self, fail: bool) {
        self.fail_reports.store(fail, Ordering::SeqCst);
    }

    pub fn user(&self, id: Uuid) -> Option<UserProfile> {
        self.users.lock().unwrap().iter().find(|u| u.id == id).cloned()
    }

    /// Seeds `count` crime reports, one second apart, newest last.
    pub fn seed_crime_reports(&self, count: usize) -> Vec<CrimeReport> {
        let base = Utc::now() - chrono::Duration::hours(1);
        let seeded: Vec<CrimeReport> = (0..count)
            .map(|i| CrimeReport {
                id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                user_name: format!("warga {}", i),
                category: crate::models::reportmodel::CrimeCategory::IllegalRacing,
                description: format!("laporan {}", i),
                location: GeoPoint { lat: -7.28 + i as f64 * 0.001, lng: 112.73 },
                location_source: crate::models::reportmodel::LocationSource::MapClick,
                street_name: None,
                status: Default::default(),
                vehicle_type: None,
                plate_number: None,
                brand: None,
                color: None,
                created_at: base + chrono::Duration::seconds(i as i64),
            })
            .collect();
        self.crime_reports.lock().unwrap().extend(seeded.clone());
        seeded
    }

    async fn before_page(&self) {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.page_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn check_reports(&self) -> Result<(), sqlx::Error> {
        if self.fail_reports.load(Ordering::SeqCst) {
            return Err(injected());
        }
        Ok(())
    }

    fn update_user<F>(&self, id: Uuid, apply: F) -> Option<UserProfile>
    where
        F: FnOnce(&mut UserProfile) -> bool,
    {
        let mut users = self.users.lock().unwrap();
        let user = users.iter_mut().find(|u| u.id == id)?;
        if !apply(user) {
            return None;
        }
        user.updated_at = Utc::now();
        Some(user.clone())
    }
}

fn page_of<T: Clone>(
    mut items: Vec<T>,
    limit: i64,
    after: Option<ReportCursor>,
    key: impl Fn(&T) -> (DateTime<Utc>, Uuid) + Copy,
) -> Vec<T> {
    newest_first(&mut items, key);
    items
        .into_iter()
        .filter(|item| {
            let (t, id) = key(item);
            after.map(|c| c.precedes(t, id)).unwrap_or(true)
        })
        .take(limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl UserExt for MemoryStore {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
        token: Option<&str>,
    ) -> Result<Option<UserProfile>, sqlx::Error> {
        self.profile_reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_profiles.load(Ordering::SeqCst) {
            return Err(injected());
        }

        let users = self.users.lock().unwrap();
        let found = users.iter().find(|u| {
            if let Some(id) = user_id {
                u.id == id
            } else if let Some(email) = email {
                u.email.eq_ignore_ascii_case(email)
            } else if let Some(token) = token {
                u.verification_token.as_deref() == Some(token)
                    && u.token_expires_at.map(|t| t > Utc::now()).unwrap_or(false)
            } else {
                false
            }
        });
        Ok(found.cloned())
    }

    async fn get_users(&self, page: u32, limit: usize) -> Result<Vec<UserProfile>, sqlx::Error> {
        let mut users = self.users.lock().unwrap().clone();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let offset = (page.max(1) as usize - 1) * limit;
        Ok(users.into_iter().skip(offset).take(limit).collect())
    }

    async fn get_user_count(&self) -> Result<i64, sqlx::Error> {
        Ok(self.users.lock().unwrap().len() as i64)
    }

    async fn save_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        verification_token: &str,
        token_expires_at: DateTime<Utc>,
    ) -> Result<UserProfile, sqlx::Error> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email.eq_ignore_ascii_case(email)) {
            return Err(unique_violation());
        }

        let now = Utc::now();
        let user = UserProfile {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: UserRole::Citizen,
            email_verified: false,
            verification_token: Some(verification_token.to_string()),
            token_expires_at: Some(token_expires_at),
            verified: false,
            verification_status: VerificationStatus::Incomplete,
            verified_at: None,
            reviewed_by: None,
            legal_name: None,
            id_number: None,
            address: None,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn verifed_token(&self, token: &str) -> Result<(), sqlx::Error> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users
            .iter_mut()
            .find(|u| u.verification_token.as_deref() == Some(token))
        {
            user.email_verified = true;
            user.verification_token = None;
            user.token_expires_at = None;
        }
        Ok(())
    }

    async fn update_user_role(
        &self,
        target_id: Uuid,
        role: UserRole,
    ) -> Result<Option<UserProfile>, sqlx::Error> {
        Ok(self.update_user(target_id, |user| {
            if user.role == UserRole::Admin {
                return false;
            }
            user.role = role;
            true
        }))
    }

    async fn update_user_profile(
        &self,
        user_id: Uuid,
        legal_name: &str,
        id_number: &str,
        address: &str,
    ) -> Result<UserProfile, sqlx::Error> {
        self.update_user(user_id, |user| {
            user.legal_name = Some(legal_name.to_string());
            user.id_number = Some(id_number.to_string());
            user.address = Some(address.to_string());
            user.verified = false;
            user.verification_status = VerificationStatus::Pending;
            true
        })
        .ok_or(sqlx::Error::RowNotFound)
    }

    async fn get_pending_profiles(&self, exclude: Uuid) -> Result<Vec<UserProfile>, sqlx::Error> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .filter(|u| u.id != exclude && u.is_pending_review())
            .cloned()
            .collect())
    }

    async fn update_verification(
        &self,
        user_id: Uuid,
        reviewer: Uuid,
        status: VerificationStatus,
    ) -> Result<Option<UserProfile>, sqlx::Error> {
        Ok(self.update_user(user_id, |user| {
            if user.verification_status != VerificationStatus::Pending {
                return false;
            }
            let approved = status == VerificationStatus::Verified;
            user.verified = approved;
            user.verification_status = status;
            user.verified_at = approved.then(Utc::now);
            user.reviewed_by = Some(reviewer);
            true
        }))
    }
}

#[async_trait]
impl ReportExt for MemoryStore {
    async fn save_crime_report(&self, report: &NewCrimeReport) -> Result<CrimeReport, sqlx::Error> {
        let saved = CrimeReport {
            id: Uuid::new_v4(),
            user_id: report.user_id,
            user_name: report.user_name.clone(),
            category: report.category,
            description: report.description.clone(),
            location: report.location,
            location_source: report.location_source,
            street_name: report.street_name.clone(),
            status: report.status,
            vehicle_type: report.vehicle_type,
            plate_number: report.plate_number.clone(),
            brand: report.brand.clone(),
            color: report.color.clone(),
            created_at: Utc::now(),
        };
        self.crime_reports.lock().unwrap().push(saved.clone());
        Ok(saved)
    }

    async fn save_road_report(&self, report: &NewRoadReport) -> Result<RoadReport, sqlx::Error> {
        let saved = RoadReport {
            id: Uuid::new_v4(),
            user_id: report.user_id,
            user_name: report.user_name.clone(),
            description: report.description.clone(),
            severity: report.severity,
            location: report.location,
            location_source: report.location_source,
            street_name: report.street_name.clone(),
            status: report.status,
            created_at: Utc::now(),
        };
        self.road_reports.lock().unwrap().push(saved.clone());
        Ok(saved)
    }

    async fn get_crime_reports_page(
        &self,
        limit: i64,
        after: Option<ReportCursor>,
    ) -> Result<Vec<CrimeReport>, sqlx::Error> {
        self.before_page().await;
        self.check_reports()?;
        let items = self.crime_reports.lock().unwrap().clone();
        Ok(page_of(items, limit, after, |r| (r.created_at, r.id)))
    }

    async fn get_road_reports_page(
        &self,
        limit: i64,
        after: Option<ReportCursor>,
    ) -> Result<Vec<RoadReport>, sqlx::Error> {
        self.before_page().await;
        self.check_reports()?;
        let items = self.road_reports.lock().unwrap().clone();
        Ok(page_of(items, limit, after, |r| (r.created_at, r.id)))
    }

    async fn get_all_crime_reports(&self) -> Result<Vec<CrimeReport>, sqlx::Error> {
        self.check_reports()?;
        let mut items = self.crime_reports.lock().unwrap().clone();
        newest_first(&mut items, |r| (r.created_at, r.id));
        Ok(items)
    }

    async fn get_all_road_reports(&self) -> Result<Vec<RoadReport>, sqlx::Error> {
        self.check_reports()?;
        let mut items = self.road_reports.lock().unwrap().clone();
        newest_first(&mut items, |r| (r.created_at, r.id));
        Ok(items)
    }
}

#[async_trait]
impl StationExt for MemoryStore {
    async fn save_police_station(
        &self,
        name: &str,
        address: &str,
        location: GeoPoint,
    ) -> Result<PoliceStation, sqlx::Error> {
        let station = PoliceStation {
            id: Uuid::new_v4(),
            name: name.to_string(),
            address: address.to_string(),
            location,
            created_at: Utc::now(),
        };
        self.stations.lock().unwrap().push(station.clone());
        Ok(station)
    }

    async fn get_police_stations(&self) -> Result<Vec<PoliceStation>, sqlx::Error> {
        let mut stations = self.stations.lock().unwrap().clone();
        stations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(stations)
    }
}

/// In-process `FeedCache`. TTLs are ignored; `hits` counts reads that found a value.
#[derive(Default)]
pub struct MemoryCache {
    pub entries: Mutex<HashMap<String, String>>,
    pub hits: AtomicUsize,
}

#[async_trait]
impl FeedCache for MemoryCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, redis::RedisError> {
        let value = self.entries.lock().unwrap().get(key).cloned();
        if value.is_some() {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }
        Ok(value)
    }

    async fn set_raw(
        &self,
        key: &str,
        value: String,
        _ttl_seconds: usize,
    ) -> Result<(), redis::RedisError> {
        self.entries.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<usize, redis::RedisError> {
        let prefix = pattern.trim_end_matches('*');
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok(before - entries.len())
    }
}
