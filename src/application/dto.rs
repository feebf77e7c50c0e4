use serde::{Deserialize, Serialize};

use crate::application::services::{InspectionReport, PersistenceStatus};
use crate::domain::{
    damage::{DamageRecord, PriceEstimate},
    evaluation::EvaluationResult,
};

pub const NOT_DETECTED_TYPE: &str = "Tidak terdeteksi";
pub const NOT_DETECTED_SEVERITY: &str = "Model kurang yakin memprediksi";
pub const PRICE_UNAVAILABLE: &str = "Tidak tersedia";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HargaEstimasi {
    Rentang { min: i64, max: i64 },
    Teks(String),
}

impl From<PriceEstimate> for HargaEstimasi {
    fn from(p: PriceEstimate) -> Self {
        match p {
            PriceEstimate::Range(r) => HargaEstimasi::Rentang { min: r.min, max: r.max },
            PriceEstimate::Unavailable => HargaEstimasi::Teks(PRICE_UNAVAILABLE.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KerusakanItem {
    pub tipe_kerusakan: String,
    pub tingkat_keparahan: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub harga_estimasi: Option<HargaEstimasi>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f32; 4]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jumlah: Option<u32>,
    pub confidence: String,
}

impl KerusakanItem {
    /// Registro centinela cuando no sobrevive ninguna detección.
    pub fn not_detected() -> Self {
        Self {
            tipe_kerusakan: NOT_DETECTED_TYPE.to_string(),
            tingkat_keparahan: NOT_DETECTED_SEVERITY.to_string(),
            harga_estimasi: None,
            bbox: None,
            jumlah: None,
            confidence: "0%".to_string(),
        }
    }
}

impl From<&DamageRecord> for KerusakanItem {
    fn from(r: &DamageRecord) -> Self {
        Self {
            tipe_kerusakan: r.damage_type.label().to_string(),
            tingkat_keparahan: r.severity.label().to_string(),
            harga_estimasi: Some(r.price.into()),
            bbox: Some(r.bbox.into()),
            jumlah: Some(r.occurrences),
            confidence: format!("{:.2}%", r.confidence * 100.0),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DetectDamageResponse {
    pub status: &'static str,
    pub waktu_proses: String,
    pub jumlah_kerusakan: usize,
    pub daftar_kerusakan: Vec<KerusakanItem>,
    pub gambar_hasil: String,
    pub evaluation_metrics: Option<EvaluationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pesan: Option<String>,
}

impl From<&InspectionReport> for DetectDamageResponse {
    fn from(report: &InspectionReport) -> Self {
        let daftar_kerusakan = if report.records.is_empty() {
            vec![KerusakanItem::not_detected()]
        } else {
            report.records.iter().map(KerusakanItem::from).collect()
        };

        let (status, pesan) = match report.persistence {
            PersistenceStatus::Failed => (
                "persistence_failed",
                Some("Hasil deteksi tidak dapat disimpan".to_string()),
            ),
            PersistenceStatus::Saved(_) => ("success", None),
        };

        Self {
            status,
            waktu_proses: format!("{:.4}s", report.elapsed.as_secs_f64()),
            jumlah_kerusakan: report.records.len(),
            daftar_kerusakan,
            gambar_hasil: report.image.base64.clone(),
            evaluation_metrics: report.evaluation.clone(),
            pesan,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub pesan: String,
}
