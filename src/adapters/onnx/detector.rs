use image::DynamicImage;
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::adapters::onnx::yolo_engine::OnnxYoloEngine;
use crate::application::ports::DetectorPort;
use crate::domain::{
    detection::Detection,
    errors::{DomainError, DomainResult},
    model::InferenceConfig,
};

/// Una sola sesión ONNX compartida; las llamadas de inferencia se serializan con el mutex.
pub struct OnnxDetector {
    engine: Mutex<OnnxYoloEngine>,
    config: InferenceConfig,
}

impl OnnxDetector {
    pub fn load(config: InferenceConfig) -> anyhow::Result<Self> {
        let engine = OnnxYoloEngine::load(&config.model.onnx_path)?;
        info!(
            "Modelo {} cargado desde {} (imgsz {})",
            config.model.name, config.model.onnx_path, config.params.input_size
        );
        Ok(Self { engine: Mutex::new(engine), config })
    }
}

impl DetectorPort for OnnxDetector {
    fn detect(&self, image: &DynamicImage) -> DomainResult<Vec<Detection>> {
        let rgb = image.to_rgb8();
        let mut engine = self
            .engine
            .lock()
            .map_err(|_| DomainError::OperationFailed("lock del motor de inferencia envenenado".into()))?;

        let t = Instant::now();
        let detections = engine.infer(&rgb, &self.config.params).map_err(|e| {
            error!("Fallo en la inferencia: {e:?}");
            DomainError::OperationFailed("fallo en la inferencia".into())
        })?;
        debug!(infer_ms = t.elapsed().as_secs_f32() * 1000.0, raw = detections.len());

        Ok(detections)
    }
}
