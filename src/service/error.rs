use thiserror::Error;
use uuid::Uuid;

use crate::error::{ErrorMessage, HttpError};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Profil pengguna {0} tidak ditemukan")]
    ProfileNotFound(Uuid),

    #[error("Silakan lengkapi profil terlebih dahulu!")]
    ProfileIncomplete,

    #[error("Profil Anda belum diverifikasi admin.")]
    ProfileNotVerified,

    #[error("Hanya warga yang dapat mengirim laporan.")]
    NotACitizen,

    #[error("Lokasi belum diambil.")]
    LocationRequired,

    #[error("Data kendaraan belum lengkap: {0}")]
    MissingVehicleDetails(&'static str),

    #[error("Profil {0} tidak sedang menunggu verifikasi")]
    NotPending(Uuid),

    #[error("Admin tidak dapat memverifikasi profilnya sendiri")]
    SelfReview,

    #[error("Akun admin tidak dapat diubah")]
    AdminAccountLocked(Uuid),

    #[error("Peran {0} tidak dapat diberikan")]
    RoleNotAssignable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::ProfileNotFound(_) => HttpError::not_found(error.to_string()),

            ServiceError::LocationRequired
            | ServiceError::MissingVehicleDetails(_)
            | ServiceError::RoleNotAssignable(_)
            | ServiceError::Validation(_) => HttpError::bad_request(error.to_string()),

            ServiceError::ProfileIncomplete
            | ServiceError::ProfileNotVerified
            | ServiceError::NotACitizen
            | ServiceError::SelfReview
            | ServiceError::AdminAccountLocked(_) => HttpError::forbidden(error.to_string()),

            ServiceError::NotPending(_) => HttpError::unique_constraint_violation(error.to_string()),

            ServiceError::Database(e) => {
                tracing::error!("Database error: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ServiceError::Validation(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn domain_errors_map_to_http_status() {
        let cases = [
            (ServiceError::LocationRequired, StatusCode::BAD_REQUEST),
            (ServiceError::ProfileNotVerified, StatusCode::FORBIDDEN),
            (ServiceError::NotPending(Uuid::nil()), StatusCode::CONFLICT),
            (ServiceError::ProfileNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (
                ServiceError::Database(sqlx::Error::RowNotFound),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(HttpError::from(error).status, status);
        }
    }

    #[test]
    fn database_details_are_not_leaked() {
        let http = HttpError::from(ServiceError::Database(sqlx::Error::Protocol(
            "relation users does not exist".to_string(),
        )));
        assert!(!http.message.contains("relation"));
    }
}
