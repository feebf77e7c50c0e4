use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Imagen inválida: {0}")]
    InvalidImage(String),
    #[error("Etiqueta desconocida: {0}")]
    UnknownLabel(String),
    #[error("El usuario {0} no tiene vehículo registrado")]
    VehicleNotFound(i64),
    #[error("Sesión inválida o ausente")]
    Unauthorized,
    #[error("Fallo de persistencia: {0}")]
    Persistence(String),
    #[error("Longitudes distintas: {predicted} predichas vs {reference} de referencia")]
    LabelLengthMismatch { predicted: usize, reference: usize },
    #[error("Error de operación: {0}")]
    OperationFailed(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

