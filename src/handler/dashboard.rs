//! Police and public-works dashboards: the paginated side list and the map.
use std::sync::Arc;

use axum::{
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;

use super::{map_center, map_feed, query_failed, session_user};
use crate::{
    dtos::{reportdtos::MapViewDto, userdtos::Response},
    error::HttpError,
    middleware::main_middleware::role_check,
    models::{
        reportmodel::{CrimeReport, RoadReport},
        usermodel::UserRole,
    },
    service::{
        map_feed::markers,
        pagination::{LoadOutcome, PagerRegistry, PagerSnapshot, ReportRecord},
        session::SessionContext,
    },
    AppState,
};

/// A report collection with a dashboard list kept in `AppState`.
pub trait DashboardRecord: ReportRecord {
    fn pagers(app_state: &AppState) -> &PagerRegistry<Self>;
}

impl DashboardRecord for CrimeReport {
    fn pagers(app_state: &AppState) -> &PagerRegistry<Self> {
        &app_state.crime_pagers
    }
}

impl DashboardRecord for RoadReport {
    fn pagers(app_state: &AppState) -> &PagerRegistry<Self> {
        &app_state.road_pagers
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardListDto<R> {
    pub status: &'static str,
    pub outcome: LoadOutcome,
    #[serde(flatten)]
    pub list: PagerSnapshot<R>,
}

pub fn police_handler() -> Router {
    Router::new()
        .route(
            "/crime-reports",
            get(open_list::<CrimeReport>).delete(close_list::<CrimeReport>),
        )
        .route("/crime-reports/more", post(load_more::<CrimeReport>))
        .route("/map", get(police_map))
        .layer(middleware::from_fn(|state, req, next| {
            role_check(state, req, next, vec![UserRole::Police])
        }))
}

pub fn public_works_handler() -> Router {
    Router::new()
        .route(
            "/road-reports",
            get(open_list::<RoadReport>).delete(close_list::<RoadReport>),
        )
        .route("/road-reports/more", post(load_more::<RoadReport>))
        .route("/map", get(public_works_map))
        .layer(middleware::from_fn(|state, req, next| {
            role_check(state, req, next, vec![UserRole::PublicWorks])
        }))
}

/// Opens the caller's list, or refreshes it when already open. Always
/// reloads from page 1.
pub async fn open_list<R: DashboardRecord>(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
) -> Result<impl IntoResponse, HttpError> {
    let user = session_user(&session)?;
    let pager = R::pagers(&app_state).open(user.id).await;
    let outcome = pager.refresh().await;

    Ok(Json(DashboardListDto {
        status: "success",
        outcome,
        list: pager.snapshot(),
    }))
}

pub async fn load_more<R: DashboardRecord>(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
) -> Result<impl IntoResponse, HttpError> {
    let user = session_user(&session)?;
    let pager = R::pagers(&app_state).open(user.id).await;
    let outcome = pager.load_more().await;

    Ok(Json(DashboardListDto {
        status: "success",
        outcome,
        list: pager.snapshot(),
    }))
}

pub async fn close_list<R: DashboardRecord>(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
) -> Result<impl IntoResponse, HttpError> {
    let user = session_user(&session)?;
    let closed = R::pagers(&app_state).close(user.id).await;

    Ok(Json(Response {
        status: "success",
        message: if closed {
            "Daftar laporan ditutup.".to_string()
        } else {
            "Tidak ada daftar laporan yang terbuka.".to_string()
        },
    }))
}

/// Crime reports plus police stations.
pub async fn police_map(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let feed = map_feed(&app_state);

    let (crime, stations) = tokio::try_join!(feed.fetch_all::<CrimeReport>(), feed.stations())
        .map_err(query_failed)?;

    let mut all_markers = markers(&crime);
    all_markers.extend(markers(&stations));

    Ok(Json(MapViewDto {
        status: "success",
        center: Some(map_center(&app_state)),
        markers: all_markers,
        crime_reports: Some(crime),
        stations: Some(stations),
        ..Default::default()
    }))
}

pub async fn public_works_map(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let road = map_feed(&app_state)
        .fetch_all::<RoadReport>()
        .await
        .map_err(query_failed)?;

    Ok(Json(MapViewDto {
        status: "success",
        center: Some(map_center(&app_state)),
        markers: markers(&road),
        road_reports: Some(road),
        ..Default::default()
    }))
}
