use async_trait::async_trait;
use image::DynamicImage;
use time::OffsetDateTime;

use crate::domain::{
    damage::{DamageRecord, DamageType, PriceRange, Severity},
    detection::Detection,
    errors::DomainResult,
    identity::{Identity, VehicleSnapshot},
    model::ModelId,
};

/// Inferencia síncrona; se ejecuta en el pool bloqueante.
pub trait DetectorPort: Send + Sync {
    fn detect(&self, image: &DynamicImage) -> DomainResult<Vec<Detection>>;
}

pub trait PriceCatalogPort: Send + Sync {
    fn lookup_price(&self, damage_type: DamageType, severity: Severity) -> Option<PriceRange>;
}

#[async_trait]
pub trait ModelCatalogPort: Send + Sync {
    async fn validate_model(&self, model: &ModelId) -> DomainResult<()>;
}

#[async_trait]
pub trait SessionStorePort: Send + Sync {
    async fn resolve(&self, token: &str) -> DomainResult<Option<Identity>>;
}

#[async_trait]
pub trait VehicleStorePort: Send + Sync {
    async fn find_by_user(&self, user_id: i64) -> DomainResult<Option<VehicleSnapshot>>;
}

#[async_trait]
pub trait DetectionStorePort: Send + Sync {
    /// Inserta todas las filas o ninguna. Devuelve el número de filas confirmadas.
    async fn insert_detection_results(
        &self,
        user_id: i64,
        vehicle: &VehicleSnapshot,
        records: &[DamageRecord],
        detected_at: OffsetDateTime,
    ) -> DomainResult<usize>;
}
