use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::application::aggregator::DEFAULT_CONFIDENCE_THRESHOLD;
use crate::domain::identity::{Role, VehicleSnapshot};
use crate::domain::model::{InferenceConfig, ModelId, YoloParams};

/// Servicio de inspección de daños en vehículos.
#[derive(Debug, Clone, Parser)]
#[command(name = "damage-inspect", version)]
pub struct Settings {
    /// Dirección de escucha HTTP.
    #[arg(long, env = "DAMAGE_BIND", default_value = "0.0.0.0:5000")]
    pub bind: String,

    /// Modelo YOLO exportado a ONNX.
    #[arg(long, env = "DAMAGE_MODEL", default_value = "model/car-damage-model.onnx")]
    pub model_path: String,

    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://damage-inspect.db")]
    pub database_url: String,

    /// Catálogo de precios en TOML. Sin él, todos los precios salen como no disponibles.
    #[arg(long, env = "DAMAGE_PRICES")]
    pub prices: Option<PathBuf>,

    /// Umbral de confianza de negocio.
    #[arg(long, env = "DAMAGE_CONFIDENCE", default_value_t = DEFAULT_CONFIDENCE_THRESHOLD,
          value_parser = parse_unit_interval)]
    pub confidence_threshold: f32,

    #[arg(long, env = "DAMAGE_IMGSZ", default_value_t = 640)]
    pub input_size: u32,

    /// Umbral propio del modelo, previo al NMS.
    #[arg(long, env = "DAMAGE_MODEL_CONF", default_value_t = 0.25, value_parser = parse_unit_interval)]
    pub model_conf: f32,

    #[arg(long, env = "DAMAGE_IOU", default_value_t = 0.45, value_parser = parse_unit_interval)]
    pub iou_threshold: f32,

    #[arg(long, env = "DAMAGE_MAX_DET", default_value_t = 300)]
    pub max_detections: usize,

    /// Tamaño máximo del cuerpo de la petición, en bytes.
    #[arg(long, env = "DAMAGE_MAX_UPLOAD", default_value_t = 10 * 1024 * 1024)]
    pub max_upload_bytes: usize,

    /// Sin subcomando se arranca el servidor.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Crea un usuario (y opcionalmente su vehículo) y emite un token de sesión.
    Seed(SeedArgs),
}

#[derive(Debug, Clone, Args)]
pub struct SeedArgs {
    #[arg(long)]
    pub username: String,

    #[arg(long)]
    pub nama_lengkap: String,

    #[arg(long, default_value = "pelanggan")]
    pub role: Role,

    #[arg(long, requires_all = ["model_kendaraan", "tahun_kendaraan"])]
    pub plat_nomor: Option<String>,

    #[arg(long, requires = "plat_nomor")]
    pub model_kendaraan: Option<String>,

    #[arg(long, requires = "plat_nomor")]
    pub tahun_kendaraan: Option<i32>,
}

impl SeedArgs {
    pub fn vehicle(&self) -> Option<VehicleSnapshot> {
        match (&self.plat_nomor, &self.model_kendaraan, self.tahun_kendaraan) {
            (Some(plat), Some(model), Some(tahun)) => Some(VehicleSnapshot {
                plat_nomor: plat.clone(),
                model_kendaraan: model.clone(),
                tahun_kendaraan: tahun,
            }),
            _ => None,
        }
    }
}

fn parse_unit_interval(s: &str) -> Result<f32, String> {
    let v: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if (0.0..=1.0).contains(&v) {
        Ok(v)
    } else {
        Err(format!("{v} fuera de [0, 1]"))
    }
}

impl Settings {
    pub fn inference(&self) -> InferenceConfig {
        InferenceConfig {
            model: ModelId { name: "car-damage".to_string(), onnx_path: self.model_path.clone() },
            params: YoloParams {
                input_size: self.input_size,
                conf_threshold: self.model_conf,
                iou_threshold: self.iou_threshold,
                max_detections: self.max_detections,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = Settings::try_parse_from(["damage-inspect"]).unwrap();
        assert_eq!(s.confidence_threshold, 0.5);
        let params = s.inference().params;
        let reference = YoloParams::default();
        assert_eq!(params.input_size, reference.input_size);
        assert_eq!(params.conf_threshold, reference.conf_threshold);
        assert_eq!(params.iou_threshold, reference.iou_threshold);
        assert_eq!(params.max_detections, reference.max_detections);
        assert!(s.prices.is_none());
        assert!(s.command.is_none());
    }

    #[test]
    fn seed_subcommand() {
        let s = Settings::try_parse_from([
            "damage-inspect", "seed", "--username", "budi", "--nama-lengkap", "Budi Santoso",
            "--plat-nomor", "B 1234 XYZ", "--model-kendaraan", "Avanza", "--tahun-kendaraan", "2019",
        ])
        .unwrap();
        let Some(Command::Seed(args)) = s.command else { panic!("expected seed") };
        assert_eq!(args.role, Role::Pelanggan);
        assert_eq!(args.vehicle().map(|v| v.tahun_kendaraan), Some(2019));

        let s = Settings::try_parse_from([
            "damage-inspect", "seed", "--username", "sari", "--nama-lengkap", "Sari", "--role", "Montir",
        ])
        .unwrap();
        let Some(Command::Seed(args)) = s.command else { panic!("expected seed") };
        assert_eq!(args.role, Role::Montir);
        assert!(args.vehicle().is_none());
    }

    #[test]
    fn seed_vehicle_needs_all_fields() {
        assert!(Settings::try_parse_from([
            "damage-inspect", "seed", "--username", "budi", "--nama-lengkap", "Budi", "--plat-nomor", "B 1",
        ])
        .is_err());
        assert!(Settings::try_parse_from(["damage-inspect", "seed", "--username", "budi"]).is_err());
    }

    #[test]
    fn rejects_threshold_outside_unit_interval() {
        assert!(Settings::try_parse_from(["damage-inspect", "--confidence-threshold", "1.5"]).is_err());
        let s = Settings::try_parse_from(["damage-inspect", "--confidence-threshold", "0.7"]).unwrap();
        assert_eq!(s.confidence_threshold, 0.7);
    }
}
