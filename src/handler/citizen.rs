use std::{sync::Arc, time::Duration};

use axum::{
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use validator::Validate;

use super::{invalidate_map_feeds, map_center, map_feed, query_failed, session_user};
use crate::{
    dtos::{
        reportdtos::{CrimeReportDraft, MapViewDto, ReportResponseDto, RoadReportDraft},
        userdtos::{FilterUserDto, FormStatusDto, ProfileUpdateDto, UserData, UserResponseDto},
    },
    error::HttpError,
    middleware::main_middleware::role_check,
    models::{
        reportmodel::{CrimeReport, RoadReport},
        usermodel::UserRole,
    },
    service::{
        map_feed::markers,
        session::SessionContext,
        submission::{ensure_can_report, ReportSubmission},
        verification_service::VerificationService,
    },
    AppState,
};

pub fn citizen_handler() -> Router {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/form-status", get(form_status))
        .route("/crime-reports", post(submit_crime_report))
        .route("/road-reports", post(submit_road_report))
        .route("/map", get(citizen_map))
        .layer(middleware::from_fn(|state, req, next| {
            role_check(state, req, next, vec![UserRole::Citizen])
        }))
}

pub async fn get_profile(
    Extension(session): Extension<SessionContext>,
) -> Result<impl IntoResponse, HttpError> {
    let user = session_user(&session)?;

    Ok(Json(UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(user),
        },
    }))
}

pub async fn update_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    Json(body): Json<ProfileUpdateDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = session_user(&session)?;
    let updated = VerificationService::new(app_state.db_client.clone())
        .complete_profile(user.id, &body)
        .await?;

    Ok(Json(UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(&updated),
        },
    }))
}

pub async fn form_status(
    Extension(session): Extension<SessionContext>,
) -> Result<impl IntoResponse, HttpError> {
    let user = session_user(&session)?;
    let message = ensure_can_report(user).err().map(|e| e.to_string());

    Ok(Json(FormStatusDto {
        can_report: message.is_none(),
        profile_complete: user.kyc_complete(),
        verified: user.verified,
        verification_status: user.verification_status,
        message,
    }))
}

pub async fn submit_crime_report(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    Json(draft): Json<CrimeReportDraft>,
) -> Result<impl IntoResponse, HttpError> {
    let user = session_user(&session)?;

    let saved = ReportSubmission::new(
        app_state.db_client.as_ref(),
        app_state.geocoder.as_ref(),
        Duration::from_millis(app_state.env.geocode_timeout_ms),
    )
    .submit_crime(user, draft)
    .await?;

    invalidate_map_feeds(&app_state).await;

    Ok((
        StatusCode::CREATED,
        Json(ReportResponseDto {
            status: "success",
            message: "Laporan kejahatan berhasil dikirim!".to_string(),
            data: saved,
        }),
    ))
}

pub async fn submit_road_report(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    Json(draft): Json<RoadReportDraft>,
) -> Result<impl IntoResponse, HttpError> {
    let user = session_user(&session)?;

    let saved = ReportSubmission::new(
        app_state.db_client.as_ref(),
        app_state.geocoder.as_ref(),
        Duration::from_millis(app_state.env.geocode_timeout_ms),
    )
    .submit_road(user, draft)
    .await?;

    invalidate_map_feeds(&app_state).await;

    Ok((
        StatusCode::CREATED,
        Json(ReportResponseDto {
            status: "success",
            message: "Laporan jalan rusak berhasil dikirim!".to_string(),
            data: saved,
        }),
    ))
}

/// Citizens see both collections on their map.
pub async fn citizen_map(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let feed = map_feed(&app_state);

    let (crime, road) = tokio::try_join!(
        feed.fetch_all::<CrimeReport>(),
        feed.fetch_all::<RoadReport>()
    )
    .map_err(query_failed)?;

    let mut all_markers = markers(&crime);
    all_markers.extend(markers(&road));

    Ok(Json(MapViewDto {
        status: "success",
        center: Some(map_center(&app_state)),
        markers: all_markers,
        crime_reports: Some(crime),
        road_reports: Some(road),
        stations: None,
    }))
}
