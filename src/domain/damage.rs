use serde::{Deserialize, Serialize};
use std::fmt;

use super::detection::BoundingBox;
use super::errors::{DomainError, DomainResult};

/// Categorías de daño que conoce el modelo, en el orden de sus índices de clase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DamageType {
    #[serde(rename = "retak")]
    Retak,
    #[serde(rename = "penyok")]
    Penyok,
    #[serde(rename = "pecah kaca")]
    PecahKaca,
    #[serde(rename = "lampu rusak")]
    LampuRusak,
    #[serde(rename = "goresan")]
    Goresan,
    #[serde(rename = "ban kempes")]
    BanKempes,
}

impl DamageType {
    pub const ALL: [DamageType; 6] = [
        DamageType::Retak,
        DamageType::Penyok,
        DamageType::PecahKaca,
        DamageType::LampuRusak,
        DamageType::Goresan,
        DamageType::BanKempes,
    ];

    /// Índice de clase del modelo -> tipo de daño. Un índice fuera del dominio
    /// significa que modelo y tabla de etiquetas no corresponden.
    pub fn from_class_index(class_id: usize) -> DomainResult<Self> {
        Self::ALL
            .get(class_id)
            .copied()
            .ok_or(DomainError::UnknownLabel(class_id.to_string()))
    }

    pub fn class_index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            DamageType::Retak => "retak",
            DamageType::Penyok => "penyok",
            DamageType::PecahKaca => "pecah kaca",
            DamageType::LampuRusak => "lampu rusak",
            DamageType::Goresan => "goresan",
            DamageType::BanKempes => "ban kempes",
        }
    }

    pub fn from_label(label: &str) -> DomainResult<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.label() == label)
            .ok_or_else(|| DomainError::UnknownLabel(label.to_string()))
    }

    /// Mapa estático tipo -> severidad. Total sobre el dominio.
    pub fn severity(self) -> Severity {
        match self {
            DamageType::Retak => Severity::RusakSedang,
            DamageType::Penyok => Severity::RusakSedang,
            DamageType::PecahKaca => Severity::RusakBerat,
            DamageType::LampuRusak => Severity::RusakSedang,
            DamageType::Goresan => Severity::RusakRingan,
            DamageType::BanKempes => Severity::RusakSedang,
        }
    }
}

impl fmt::Display for DamageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Nivel de impacto, ordenado de menor a mayor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "Rusak Ringan")]
    RusakRingan,
    #[serde(rename = "Rusak Sedang")]
    RusakSedang,
    #[serde(rename = "Rusak Berat")]
    RusakBerat,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::RusakRingan => "Rusak Ringan",
            Severity::RusakSedang => "Rusak Sedang",
            Severity::RusakBerat => "Rusak Berat",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rango de precio estimado de reparación, en rupias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceEstimate {
    Range(PriceRange),
    Unavailable,
}

impl PriceEstimate {
    pub fn range(&self) -> Option<PriceRange> {
        match self {
            PriceEstimate::Range(r) => Some(*r),
            PriceEstimate::Unavailable => None,
        }
    }
}

impl From<Option<PriceRange>> for PriceEstimate {
    fn from(value: Option<PriceRange>) -> Self {
        value.map(PriceEstimate::Range).unwrap_or(PriceEstimate::Unavailable)
    }
}

/// Resultado deduplicado por tipo de daño dentro de una petición.
#[derive(Debug, Clone, PartialEq)]
pub struct DamageRecord {
    pub damage_type: DamageType,
    pub severity: Severity,
    pub price: PriceEstimate,
    pub bbox: BoundingBox,
    pub confidence: f32,
    /// Detecciones del mismo tipo que superaron el umbral.
    pub occurrences: u32,
}
