use std::sync::Arc;

use axum::{extract::Query, middleware, response::IntoResponse, routing::get, Extension, Json, Router};
use serde::Serialize;
use validator::Validate;

use super::query_failed;
use crate::{
    dtos::reportdtos::PageQueryDto,
    error::HttpError,
    middleware::main_middleware::role_check,
    models::{
        cursor::ReportCursor,
        reportmodel::{CrimeReport, RoadReport},
        usermodel::UserRole,
    },
    service::pagination::{fetch_page, Page, ReportRecord},
    AppState,
};

#[derive(Debug, Serialize)]
pub struct PageResponseDto<R> {
    pub status: &'static str,
    #[serde(flatten)]
    pub page: Page<R>,
}

pub fn reports_handler() -> Router {
    Router::new()
        .route(
            "/crime",
            get(get_page::<CrimeReport>).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Police, UserRole::Admin])
            })),
        )
        .route(
            "/road",
            get(get_page::<RoadReport>).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::PublicWorks, UserRole::Admin])
            })),
        )
}

/// One page of a collection, newest first. Clients pass `next_cursor` back
/// as `after` to continue.
pub async fn get_page<R: ReportRecord>(
    Query(query): Query<PageQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    query
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let after = match query.after.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            ReportCursor::decode(raw)
                .ok_or_else(|| HttpError::bad_request("Cursor tidak valid"))?,
        ),
        None => None,
    };

    let page_size = query.limit.unwrap_or(app_state.env.dashboard_page_size);
    let page = fetch_page::<R>(app_state.db_client.as_ref(), page_size, after)
        .await
        .map_err(query_failed)?;

    Ok(Json(PageResponseDto {
        status: "success",
        page,
    }))
}
