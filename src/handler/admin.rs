use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use super::{invalidate_map_feeds, query_failed, session_user};
use crate::{
    dtos::{
        admindtos::{
            CreateStationDto, PendingProfilesResponseDto, ReviewDecision, ReviewResponseDto,
            ReviewVerificationDto,
        },
        userdtos::{
            FilterUserDto, RequestQueryDto, RoleUpdateDto, UserData, UserListResponseDto,
            UserResponseDto,
        },
    },
    error::HttpError,
    middleware::main_middleware::role_check,
    models::{stationmodel::PoliceStation, usermodel::UserRole},
    service::{
        error::ServiceError,
        session::SessionContext,
        verification_service::{ReviewOutcome, VerificationService},
    },
    AppState,
};

#[derive(Debug, Serialize)]
pub struct StationListResponseDto {
    pub status: &'static str,
    pub stations: Vec<PoliceStation>,
}

#[derive(Debug, Serialize)]
pub struct StationResponseDto {
    pub status: &'static str,
    pub station: PoliceStation,
}

pub fn admin_handler() -> Router {
    Router::new()
        .route("/users", get(get_users))
        .route("/users/role", put(update_user_role))
        .route("/verifications/pending", get(get_pending_verifications))
        .route("/verifications/:user_id", put(review_verification))
        .route(
            "/police-stations",
            get(get_police_stations).post(create_police_station),
        )
        .layer(middleware::from_fn(|state, req, next| {
            role_check(state, req, next, vec![UserRole::Admin])
        }))
}

pub async fn get_users(
    Query(query_params): Query<RequestQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    query_params
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = query_params.page.unwrap_or(1) as u32;
    let limit = query_params.limit.unwrap_or(10);

    let users = app_state
        .db_client
        .get_users(page, limit)
        .await
        .map_err(query_failed)?;

    let user_count = app_state
        .db_client
        .get_user_count()
        .await
        .map_err(query_failed)?;

    Ok(Json(UserListResponseDto {
        status: "success".to_string(),
        users: FilterUserDto::filter_users(&users),
        results: user_count,
    }))
}

/// Promotes or demotes a non-admin account. The response is the stored row.
pub async fn update_user_role(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RoleUpdateDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|_| ServiceError::RoleNotAssignable(body.role.to_str().to_string()))?;

    let target = app_state
        .db_client
        .get_user(Some(body.target_user_id), None, None)
        .await
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::ProfileNotFound(body.target_user_id))?;

    if target.role == UserRole::Admin {
        return Err(ServiceError::AdminAccountLocked(target.id).into());
    }

    let updated = app_state
        .db_client
        .update_user_role(target.id, body.role)
        .await
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::AdminAccountLocked(target.id))?;

    tracing::info!(
        "Role of {} changed from {} to {}",
        updated.id,
        target.role.to_str(),
        updated.role.to_str()
    );

    Ok(Json(UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(&updated),
        },
    }))
}

pub async fn get_pending_verifications(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
) -> Result<impl IntoResponse, HttpError> {
    let admin = session_user(&session)?;

    let pending = VerificationService::new(app_state.db_client.clone())
        .pending_profiles(admin.id)
        .await?;

    Ok(Json(PendingProfilesResponseDto {
        status: "success",
        results: pending.len(),
        users: FilterUserDto::filter_users(&pending),
    }))
}

pub async fn review_verification(
    Path(user_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    Json(body): Json<ReviewVerificationDto>,
) -> Result<impl IntoResponse, HttpError> {
    let admin = session_user(&session)?;

    let outcome = VerificationService::new(app_state.db_client.clone())
        .review(admin.id, user_id, body.decision, body.confirm)
        .await?;

    let (applied, profile) = match outcome {
        ReviewOutcome::Preview(profile) => (false, profile),
        ReviewOutcome::Applied(profile) => (true, profile),
    };

    let message = match (body.decision, applied) {
        (ReviewDecision::Approve, false) => "Setujui verifikasi profil ini? Kirim ulang dengan confirm: true.",
        (ReviewDecision::Deny, false) => "Tolak verifikasi profil ini? Kirim ulang dengan confirm: true.",
        (ReviewDecision::Approve, true) => "Profil berhasil diverifikasi.",
        (ReviewDecision::Deny, true) => "Verifikasi profil ditolak.",
    };

    Ok(Json(ReviewResponseDto {
        status: "success",
        applied,
        message: message.to_string(),
        user: FilterUserDto::filter_user(&profile),
    }))
}

pub async fn get_police_stations(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let stations = app_state
        .db_client
        .get_police_stations()
        .await
        .map_err(query_failed)?;

    Ok(Json(StationListResponseDto {
        status: "success",
        stations,
    }))
}

pub async fn create_police_station(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<CreateStationDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let station = app_state
        .db_client
        .save_police_station(body.name.trim(), body.address.trim(), body.location)
        .await
        .map_err(query_failed)?;

    invalidate_map_feeds(&app_state).await;
    tracing::info!("Police station {} created", station.id);

    Ok((
        StatusCode::CREATED,
        Json(StationResponseDto {
            status: "success",
            station,
        }),
    ))
}
