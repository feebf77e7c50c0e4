use image::DynamicImage;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

use crate::{
    application::{
        aggregator::aggregate,
        ports::{DetectionStorePort, DetectorPort, PriceCatalogPort, VehicleStorePort},
        render::{render, RenderedImage},
    },
    domain::{
        damage::{DamageRecord, DamageType},
        errors::{DomainError, DomainResult},
        evaluation::{score, EvaluationResult},
        identity::Identity,
    },
};

/// Etapas por las que pasa una petición de inspección.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectionStage {
    Received,
    Decoded,
    Detected,
    Aggregated,
    Scored,
    Rendered,
    Persisted,
    Responded,
}

impl fmt::Display for InspectionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceStatus {
    Saved(usize),
    Failed,
}

#[derive(Debug, Clone)]
pub struct InspectionReport {
    pub records: Vec<DamageRecord>,
    pub evaluation: Option<EvaluationResult>,
    pub image: RenderedImage,
    pub elapsed: Duration,
    pub persistence: PersistenceStatus,
}

pub fn decode_image(bytes: &[u8]) -> DomainResult<DynamicImage> {
    if bytes.is_empty() {
        return Err(DomainError::InvalidImage("archivo vacío".into()));
    }
    image::load_from_memory(bytes).map_err(|e| DomainError::InvalidImage(e.to_string()))
}

/// Orquestador de la inspección: vehículo -> decodificación -> inferencia ->
/// agregación -> métricas -> render -> persistencia.
#[derive(Clone)]
pub struct InspectionService {
    detector: Arc<dyn DetectorPort>,
    pricing: Arc<dyn PriceCatalogPort>,
    vehicles: Arc<dyn VehicleStorePort>,
    store: Arc<dyn DetectionStorePort>,
    confidence_threshold: f32,
}

struct Analysis {
    records: Vec<DamageRecord>,
    evaluation: Option<EvaluationResult>,
    image: RenderedImage,
}

impl InspectionService {
    pub fn new(
        detector: Arc<dyn DetectorPort>,
        pricing: Arc<dyn PriceCatalogPort>,
        vehicles: Arc<dyn VehicleStorePort>,
        store: Arc<dyn DetectionStorePort>,
        confidence_threshold: f32,
    ) -> Self {
        Self { detector, pricing, vehicles, store, confidence_threshold }
    }

    pub async fn inspect(&self, identity: &Identity, upload: Vec<u8>) -> DomainResult<InspectionReport> {
        let user_id = identity.user_id;
        debug!(user_id, stage = %InspectionStage::Received, bytes = upload.len());

        if upload.is_empty() {
            return Err(DomainError::InvalidImage("archivo vacío".into()));
        }

        // El vehículo se busca antes de decodificar: un usuario sin vehículo recibe
        // VehicleNotFound aunque la imagen tampoco sea válida.
        let vehicle = self
            .vehicles
            .find_by_user(user_id)
            .await?
            .ok_or(DomainError::VehicleNotFound(user_id))?;

        let started = Instant::now();
        let detector = self.detector.clone();
        let pricing = self.pricing.clone();
        let threshold = self.confidence_threshold;

        let analysis = tokio::task::spawn_blocking(move || {
            analyze(detector.as_ref(), pricing.as_ref(), threshold, &upload, user_id)
        })
        .await
        .map_err(|e| DomainError::OperationFailed(format!("tarea de inferencia abortada: {e}")))??;
        let elapsed = started.elapsed();

        let persistence = if analysis.records.is_empty() {
            PersistenceStatus::Saved(0)
        } else {
            match self
                .store
                .insert_detection_results(user_id, &vehicle, &analysis.records, OffsetDateTime::now_utc())
                .await
            {
                Ok(rows) => PersistenceStatus::Saved(rows),
                Err(e) => {
                    error!(user_id, "No se pudieron guardar las detecciones: {e}");
                    PersistenceStatus::Failed
                }
            }
        };
        debug!(user_id, stage = %InspectionStage::Persisted, ?persistence);

        info!(
            user_id,
            plat_nomor = %vehicle.plat_nomor,
            damages = analysis.records.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Inspección completada"
        );

        Ok(InspectionReport {
            records: analysis.records,
            evaluation: analysis.evaluation,
            image: analysis.image,
            elapsed,
            persistence,
        })
    }
}

fn analyze(
    detector: &dyn DetectorPort,
    pricing: &dyn PriceCatalogPort,
    threshold: f32,
    upload: &[u8],
    user_id: i64,
) -> DomainResult<Analysis> {
    let image = decode_image(upload).inspect_err(|e| warn!(user_id, "Imagen rechazada: {e}"))?;
    debug!(user_id, stage = %InspectionStage::Decoded, width = image.width(), height = image.height());

    let detections = detector.detect(&image)?;
    debug!(user_id, stage = %InspectionStage::Detected, raw = detections.len());

    let records = aggregate(&detections, threshold, pricing)
        .inspect_err(|e| error!(user_id, "Modelo y tabla de etiquetas no coinciden: {e}"))?;
    debug!(user_id, stage = %InspectionStage::Aggregated, records = records.len());

    // Sin oráculo independiente: cada etiqueta predicha hace de su propia referencia.
    let labels: Vec<DamageType> = records.iter().map(|r| r.damage_type).collect();
    let evaluation = score(&labels, &labels, &DamageType::ALL)?;
    debug!(user_id, stage = %InspectionStage::Scored, scored = evaluation.is_some());

    let rendered = render(&image, &records)?;
    debug!(
        user_id,
        stage = %InspectionStage::Rendered,
        content_type = rendered.content_type,
        b64_len = rendered.base64.len()
    );

    Ok(Analysis { records, evaluation, image: rendered })
}
