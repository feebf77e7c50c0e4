use async_trait::async_trait;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use uuid::Uuid;

use super::{db_err, SqliteStore};
use crate::application::ports::SessionStorePort;
use crate::domain::{
    errors::{DomainError, DomainResult},
    identity::{Identity, Role, VehicleSnapshot},
};

impl SqliteStore {
    pub async fn create_user(&self, username: &str, nama_lengkap: &str, role: Role) -> DomainResult<i64> {
        let username = username.trim();
        let nama_lengkap = nama_lengkap.trim();
        if username.is_empty() || nama_lengkap.is_empty() {
            return Err(DomainError::OperationFailed("username y nama_lengkap son obligatorios".into()));
        }
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (username, nama_lengkap, role) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(username)
        .bind(nama_lengkap)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(id)
    }

    /// Emite un token opaco para el usuario.
    pub async fn issue_session(&self, user_id: i64) -> DomainResult<String> {
        let token = Uuid::new_v4().simple().to_string();
        let created_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|e| DomainError::OperationFailed(e.to_string()))?;
        sqlx::query("INSERT INTO sessions (token, user_id, created_at) VALUES ($1, $2, $3)")
            .bind(&token)
            .bind(user_id)
            .bind(created_at)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(token)
    }

    /// Alta de una cuenta desde la línea de comandos: usuario, vehículo opcional y sesión.
    pub async fn seed_account(
        &self,
        username: &str,
        nama_lengkap: &str,
        role: Role,
        vehicle: Option<&VehicleSnapshot>,
    ) -> DomainResult<(i64, String)> {
        let user_id = self.create_user(username, nama_lengkap, role).await?;
        if let Some(vehicle) = vehicle {
            self.register_vehicle(user_id, vehicle).await?;
        }
        let token = self.issue_session(user_id).await?;
        Ok((user_id, token))
    }
}

#[async_trait]
impl SessionStorePort for SqliteStore {
    async fn resolve(&self, token: &str) -> DomainResult<Option<Identity>> {
        let row = sqlx::query_as::<_, (i64, String)>(
            "SELECT u.id, u.role FROM sessions s JOIN users u ON u.id = s.user_id WHERE s.token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(|(user_id, role)| Ok(Identity { user_id, role: role.parse()? }))
            .transpose()
    }
}
