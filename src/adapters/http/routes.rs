use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::{debug, warn};

use crate::adapters::http::{auth::AuthenticatedUser, error::ApiError, state::HttpState};
use crate::application::dto::DetectDamageResponse;
use crate::application::services::{InspectionStage, PersistenceStatus};
use crate::domain::errors::DomainError;

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Lee el campo `file` del formulario; el resto de campos se ignoran.
async fn read_file_field(multipart: &mut Multipart) -> Result<Vec<u8>, ApiError> {
    loop {
        let field = multipart.next_field().await.map_err(|e| {
            warn!("Multipart inválido: {e}");
            DomainError::InvalidImage("multipart inválido".into())
        })?;
        let Some(field) = field else {
            return Err(DomainError::InvalidImage("falta el campo file".into()).into());
        };
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| DomainError::InvalidImage(format!("lectura del fichero: {e}")))?;
            return Ok(bytes.to_vec());
        }
    }
}

pub async fn detect_damage(
    State(st): State<HttpState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        warn!("Petición sin multipart válido: {e}");
        DomainError::InvalidImage("se esperaba multipart/form-data".into())
    })?;
    let upload = read_file_field(&mut multipart).await?;
    let report = st.inspection.inspect(&identity, upload).await?;

    let status = match report.persistence {
        PersistenceStatus::Saved(_) => StatusCode::OK,
        PersistenceStatus::Failed => StatusCode::INTERNAL_SERVER_ERROR,
    };
    debug!(user_id = identity.user_id, stage = %InspectionStage::Responded, %status);

    Ok((status, Json(DetectDamageResponse::from(&report))))
}
