use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use tracing::{error, warn};

use crate::application::dto::ErrorResponse;
use crate::domain::errors::DomainError;

/// Error de la capa HTTP. El detalle interno se registra pero nunca se devuelve.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            DomainError::InvalidImage(_) => StatusCode::BAD_REQUEST,
            DomainError::Unauthorized => StatusCode::UNAUTHORIZED,
            DomainError::VehicleNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> &'static str {
        match self.0 {
            DomainError::InvalidImage(_) => "Mohon masukkan file gambar yang valid",
            DomainError::Unauthorized => "Token tidak valid atau tidak ada",
            DomainError::VehicleNotFound(_) => "Data kendaraan tidak ditemukan, silakan tambahkan kendaraan terlebih dahulu",
            _ => "Terjadi kesalahan internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Petición fallida: {}", self.0);
        } else {
            warn!("Petición rechazada ({status}): {}", self.0);
        }
        let body = ErrorResponse { status: "error".into(), pesan: self.public_message().into() };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(ApiError(DomainError::InvalidImage("x".into())).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError(DomainError::Unauthorized).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError(DomainError::VehicleNotFound(1)).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError(DomainError::UnknownLabel("99".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError(DomainError::Persistence("disk full".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
