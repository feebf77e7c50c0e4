use crate::application::ports::PriceCatalogPort;
use crate::domain::{
    damage::{DamageRecord, DamageType},
    detection::Detection,
    errors::DomainResult,
};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Filtra por umbral, deja una sola detección por tipo (la de mayor confianza,
/// la primera en caso de empate) y la enriquece con severidad y precio.
///
/// El orden de salida es el de la primera aparición de cada tipo superviviente.
pub fn aggregate(
    detections: &[Detection],
    confidence_threshold: f32,
    pricing: &dyn PriceCatalogPort,
) -> DomainResult<Vec<DamageRecord>> {
    // Índice de clase inválido = despliegue roto; se comprueba antes del umbral.
    let typed = detections
        .iter()
        .map(|d| DamageType::from_class_index(d.class_id).map(|t| (t, d)))
        .collect::<DomainResult<Vec<_>>>()?;

    let mut best: Vec<(DamageType, &Detection, u32)> = Vec::new();
    for (damage_type, det) in typed {
        // NaN no supera ningún umbral.
        if det.score.is_nan() || det.score < confidence_threshold {
            continue;
        }
        match best.iter_mut().find(|(t, _, _)| *t == damage_type) {
            Some(slot) => {
                slot.2 += 1;
                if det.score > slot.1.score {
                    slot.1 = det;
                }
            }
            None => best.push((damage_type, det, 1)),
        }
    }

    Ok(best
        .into_iter()
        .map(|(damage_type, det, occurrences)| {
            let severity = damage_type.severity();
            DamageRecord {
                damage_type,
                severity,
                price: pricing.lookup_price(damage_type, severity).into(),
                bbox: det.bbox(),
                confidence: det.score,
                occurrences,
            }
        })
        .collect())
}
