use async_trait::async_trait;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::debug;

use super::{db_err, SqliteStore};
use crate::application::ports::DetectionStorePort;
use crate::domain::{
    damage::DamageRecord,
    errors::{DomainError, DomainResult},
    identity::VehicleSnapshot,
};

impl SqliteStore {
    pub async fn count_detection_results(&self, user_id: i64) -> DomainResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM detection_results WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl DetectionStorePort for SqliteStore {
    async fn insert_detection_results(
        &self,
        user_id: i64,
        vehicle: &VehicleSnapshot,
        records: &[DamageRecord],
        detected_at: OffsetDateTime,
    ) -> DomainResult<usize> {
        let detection_time = detected_at
            .format(&Rfc3339)
            .map_err(|e| DomainError::OperationFailed(e.to_string()))?;

        // Si algo falla, la transacción se descarta al salir y se hace rollback.
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        for r in records {
            let price = r.price.range();
            sqlx::query(
                r#"INSERT INTO detection_results (
                    user_id, label, severity, confidence, count,
                    bbox_x1, bbox_y1, bbox_x2, bbox_y2,
                    price_min, price_max, detection_time,
                    plat_nomor, model_kendaraan, tahun_kendaraan
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)"#,
            )
            .bind(user_id)
            .bind(r.damage_type.label())
            .bind(r.severity.label())
            .bind(r.confidence as f64)
            .bind(r.occurrences as i64)
            .bind(r.bbox.x1 as f64)
            .bind(r.bbox.y1 as f64)
            .bind(r.bbox.x2 as f64)
            .bind(r.bbox.y2 as f64)
            .bind(price.map(|p| p.min))
            .bind(price.map(|p| p.max))
            .bind(&detection_time)
            .bind(&vehicle.plat_nomor)
            .bind(&vehicle.model_kendaraan)
            .bind(vehicle.tahun_kendaraan)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }
        tx.commit().await.map_err(db_err)?;

        debug!(user_id, rows = records.len(), "Resultados de detección guardados");
        Ok(records.len())
    }
}
