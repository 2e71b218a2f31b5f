use std::fmt;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", serde_json::to_string(&self).unwrap_or_default())
    }
}

/// User-facing messages. The product ships in Indonesian.
#[derive(Debug, PartialEq)]
pub enum ErrorMessage {
    EmptyPassword,
    ExceededMaxPasswordLength(usize),
    HashingError,
    InvalidHashFormat,
    InvalidToken,
    ServerError,
    WrongCredentials,
    EmailExist,
    EmailNotVerified,
    TooManyAttempts,
    UserNoLongerExist,
    TokenNotProvided,
    PermissionDenied,
    UserNotAuthenticated,
    SessionLoading,
    ProfileIncomplete,
    ProfileNotVerified,
    LocationRequired,
}

impl ToString for ErrorMessage {
    fn to_string(&self) -> String {
        self.to_str().to_owned()
    }
}

impl ErrorMessage {
    fn to_str(&self) -> String {
        match self {
            ErrorMessage::ServerError => "Terjadi kesalahan. Coba lagi nanti.".to_string(),
            ErrorMessage::WrongCredentials => "Email atau password salah.".to_string(),
            ErrorMessage::EmailExist => "Email sudah terdaftar.".to_string(),
            ErrorMessage::EmailNotVerified => {
                "Email belum diverifikasi. Silakan cek email Anda.".to_string()
            }
            ErrorMessage::TooManyAttempts => {
                "Terlalu banyak percobaan login. Coba lagi nanti.".to_string()
            }
            ErrorMessage::UserNoLongerExist => {
                "Data pengguna tidak ditemukan. Silakan hubungi admin.".to_string()
            }
            ErrorMessage::EmptyPassword => "Password tidak boleh kosong.".to_string(),
            ErrorMessage::HashingError => "Gagal memproses password.".to_string(),
            ErrorMessage::InvalidHashFormat => "Format hash password tidak valid.".to_string(),
            ErrorMessage::ExceededMaxPasswordLength(max_length) => {
                format!("Password maksimal {} karakter.", max_length)
            }
            ErrorMessage::InvalidToken => "Token tidak valid atau sudah kedaluwarsa.".to_string(),
            ErrorMessage::TokenNotProvided => "Silakan login terlebih dahulu.".to_string(),
            ErrorMessage::UserNotAuthenticated => "Silakan login terlebih dahulu.".to_string(),
            ErrorMessage::PermissionDenied => {
                "Anda tidak memiliki akses ke halaman ini.".to_string()
            }
            ErrorMessage::SessionLoading => "Memuat data pengguna...".to_string(),
            ErrorMessage::ProfileIncomplete => {
                "Silakan lengkapi profil terlebih dahulu!".to_string()
            }
            ErrorMessage::ProfileNotVerified => {
                "Profil Anda belum diverifikasi admin.".to_string()
            }
            ErrorMessage::LocationRequired => "Lokasi belum diambil.".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpError {
    pub message: String,
    pub status: StatusCode,
    pub redirect: Option<&'static str>,
}

impl HttpError {
    pub fn new(message: impl Into<String>, status: StatusCode) -> Self {
        HttpError {
            message: message.into(),
            status,
            redirect: None,
        }
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        HttpError::new(message, StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        HttpError::new(message, StatusCode::BAD_REQUEST)
    }

    pub fn unique_constraint_violation(message: impl Into<String>) -> Self {
        HttpError::new(message, StatusCode::CONFLICT)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        HttpError::new(message, StatusCode::UNAUTHORIZED)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        HttpError::new(message, StatusCode::FORBIDDEN)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        HttpError::new(message, StatusCode::NOT_FOUND)
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        HttpError::new(message, StatusCode::TOO_MANY_REQUESTS)
    }

    pub fn with_redirect(mut self, path: &'static str) -> Self {
        self.redirect = Some(path);
        self
    }

    pub fn into_http_response(self) -> Response {
        let json_response = Json(ErrorResponse {
            status: "fail".to_string(),
            message: self.message.clone(),
            redirect: self.redirect.map(str::to_string),
        });

        let mut response = (self.status, json_response).into_response();

        if self.status == StatusCode::SERVICE_UNAVAILABLE {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
        }

        response
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HttpError: message: {}, status: {}",
            self.message, self.status
        )
    }
}

impl std::error::Error for HttpError {}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}
