use std::sync::Arc;

use axum::{
    extract::Query,
    http::{header, HeaderValue},
    middleware,
    response::{IntoResponse, Redirect, Response as AxumResponse},
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::Cookie;
use chrono::{Duration, Utc};
use validator::Validate;

use crate::{
    dtos::userdtos::{
        FilterUserDto, LoginUserDto, RegisterUserDto, Response, UserData, UserLoginResponseDto,
        UserResponseDto, VerifyEmailQueryDto,
    },
    error::{ErrorMessage, HttpError},
    mail::mails::send_verification_email,
    middleware::rate_limit::{rate_limit_middleware, RateLimiter},
    utils::{password, token},
    AppState,
};

pub fn auth_handler(login_limiter: Arc<RateLimiter>) -> Router {
    Router::new()
        .route("/register", post(register))
        .route(
            "/login",
            post(login).layer(middleware::from_fn_with_state(
                login_limiter,
                rate_limit_middleware,
            )),
        )
        .route("/logout", post(logout))
        .route("/verify", get(verify_email))
}

fn attach_cookie(mut response: AxumResponse, cookie: Cookie<'_>) -> Result<AxumResponse, HttpError> {
    let value = HeaderValue::from_str(&cookie.to_string())
        .map_err(|e| HttpError::server_error(e.to_string()))?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(response)
}

/// A concurrent sign-up with the same e-mail surfaces as the UNIQUE index.
fn registration_failed(e: sqlx::Error) -> HttpError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return HttpError::unique_constraint_violation(ErrorMessage::EmailExist.to_string());
        }
    }
    HttpError::server_error(e.to_string())
}

pub async fn register(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let email = body.email.trim().to_lowercase();

    let existing_user = app_state
        .db_client
        .get_user(None, Some(&email), None)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if existing_user.is_some() {
        return Err(HttpError::unique_constraint_violation(
            ErrorMessage::EmailExist.to_string(),
        ));
    }

    let hashed_password =
        password::hash(&body.password).map_err(|e| HttpError::server_error(e.to_string()))?;

    let verification_token = uuid::Uuid::new_v4().to_string();
    let token_expires_at = Utc::now() + Duration::hours(24);

    let user = app_state
        .db_client
        .save_user(
            body.name.trim(),
            &email,
            &hashed_password,
            &verification_token,
            token_expires_at,
        )
        .await
        .map_err(registration_failed)?;

    // Registration succeeds even when the mail cannot be sent.
    if let Err(e) =
        send_verification_email(&app_state.env, &user.email, &user.name, &verification_token).await
    {
        tracing::error!("Failed to send verification email to {}: {}", user.email, e);
    }

    tracing::info!("Registered citizen account {}", user.id);

    Ok((
        axum::http::StatusCode::CREATED,
        Json(UserResponseDto {
            status: "success".to_string(),
            data: UserData {
                user: FilterUserDto::filter_user(&user),
            },
        }),
    ))
}

pub async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<LoginUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let result = app_state
        .db_client
        .get_user(None, Some(body.email.trim()), None)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let user = result.ok_or(HttpError::bad_request(
        ErrorMessage::WrongCredentials.to_string(),
    ))?;

    let password_matched = password::compare(&body.password, &user.password)
        .map_err(|_| HttpError::bad_request(ErrorMessage::WrongCredentials.to_string()))?;

    if !password_matched {
        return Err(HttpError::bad_request(
            ErrorMessage::WrongCredentials.to_string(),
        ));
    }

    if !user.email_verified {
        return Err(HttpError::forbidden(
            ErrorMessage::EmailNotVerified.to_string(),
        ));
    }

    let token = token::create_token(
        &user.id.to_string(),
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage,
    )
    .map_err(|e| HttpError::server_error(e.to_string()))?;

    let cookie = Cookie::build(("token", token.clone()))
        .path("/")
        .max_age(time::Duration::minutes(app_state.env.jwt_maxage))
        .http_only(true)
        .build();

    let response = Json(UserLoginResponseDto {
        status: "success".to_string(),
        token,
        redirect: user.role.dashboard_path().to_string(),
    })
    .into_response();

    attach_cookie(response, cookie)
}

pub async fn logout() -> Result<impl IntoResponse, HttpError> {
    let cookie = Cookie::build(("token", ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .http_only(true)
        .build();

    let response = Json(Response {
        status: "success",
        message: "Berhasil keluar.".to_string(),
    })
    .into_response();

    attach_cookie(response, cookie)
}

pub async fn verify_email(
    Query(query_params): Query<VerifyEmailQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    query_params
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let result = app_state
        .db_client
        .get_user(None, None, Some(&query_params.token))
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let user = result.ok_or(HttpError::bad_request(
        ErrorMessage::InvalidToken.to_string(),
    ))?;

    app_state
        .db_client
        .verifed_token(&query_params.token)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    tracing::info!("Email verified for {}", user.id);

    let login_url = format!("{}/login", app_state.env.frontend_url.trim_end_matches('/'));
    Ok(Redirect::to(&login_url))
}
