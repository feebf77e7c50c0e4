use async_trait::async_trait;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use super::{db_err, SqliteStore};
use crate::application::ports::VehicleStorePort;
use crate::domain::{
    errors::{DomainError, DomainResult},
    identity::VehicleSnapshot,
};

impl SqliteStore {
    /// Registra o reemplaza el vehículo del usuario (uno por usuario).
    pub async fn register_vehicle(&self, user_id: i64, vehicle: &VehicleSnapshot) -> DomainResult<()> {
        let now = OffsetDateTime::now_utc();
        let current_year = now.year();
        if vehicle.plat_nomor.trim().is_empty() || vehicle.model_kendaraan.trim().is_empty() {
            return Err(DomainError::OperationFailed("plat_nomor y model_kendaraan son obligatorios".into()));
        }
        if vehicle.tahun_kendaraan < 1900 || vehicle.tahun_kendaraan > current_year {
            return Err(DomainError::OperationFailed(format!(
                "tahun_kendaraan debe estar entre 1900 y {current_year}"
            )));
        }
        let created_at = now
            .format(&Rfc3339)
            .map_err(|e| DomainError::OperationFailed(e.to_string()))?;

        sqlx::query(
            r#"INSERT INTO vehicles (user_id, plat_nomor, model_kendaraan, tahun_kendaraan, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE SET
                plat_nomor = EXCLUDED.plat_nomor,
                model_kendaraan = EXCLUDED.model_kendaraan,
                tahun_kendaraan = EXCLUDED.tahun_kendaraan"#,
        )
        .bind(user_id)
        .bind(vehicle.plat_nomor.trim())
        .bind(vehicle.model_kendaraan.trim())
        .bind(vehicle.tahun_kendaraan)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }
}

#[async_trait]
impl VehicleStorePort for SqliteStore {
    async fn find_by_user(&self, user_id: i64) -> DomainResult<Option<VehicleSnapshot>> {
        let row = sqlx::query_as::<_, (String, String, i32)>(
            "SELECT plat_nomor, model_kendaraan, tahun_kendaraan FROM vehicles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(|(plat_nomor, model_kendaraan, tahun_kendaraan)| VehicleSnapshot {
            plat_nomor,
            model_kendaraan,
            tahun_kendaraan,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::identity::Role;

    fn avanza(year: i32) -> VehicleSnapshot {
        VehicleSnapshot {
            plat_nomor: "B 1234 XYZ".into(),
            model_kendaraan: "Avanza".into(),
            tahun_kendaraan: year,
        }
    }

    #[tokio::test]
    async fn register_then_find() -> anyhow::Result<()> {
        let store = SqliteStore::in_memory().await?;
        let id = store.create_user("andi", "Andi", Role::Pelanggan).await?;
        assert_eq!(store.find_by_user(id).await?, None);

        store.register_vehicle(id, &avanza(2019)).await?;
        store.register_vehicle(id, &avanza(2020)).await?;
        assert_eq!(store.find_by_user(id).await?, Some(avanza(2020)));
        Ok(())
    }

    #[tokio::test]
    async fn rejects_out_of_range_year() -> anyhow::Result<()> {
        let store = SqliteStore::in_memory().await?;
        let id = store.create_user("dewi", "Dewi", Role::Pelanggan).await?;
        assert!(store.register_vehicle(id, &avanza(1899)).await.is_err());
        assert!(store.register_vehicle(id, &avanza(9999)).await.is_err());
        Ok(())
    }
}
