use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Pelanggan,
    Admin,
    Pemilik,
    Montir,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Pelanggan => "pelanggan",
            Role::Admin => "admin",
            Role::Pemilik => "pemilik",
            Role::Montir => "montir",
        }
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pelanggan" => Ok(Role::Pelanggan),
            "admin" => Ok(Role::Admin),
            "pemilik" => Ok(Role::Pemilik),
            "montir" => Ok(Role::Montir),
            other => Err(DomainError::OperationFailed(format!("rol desconocido: {other}"))),
        }
    }
}

/// Identidad autenticada. Siempre lleva id y rol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: i64,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    pub plat_nomor: String,
    pub model_kendaraan: String,
    pub tahun_kendaraan: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing_is_case_insensitive() {
        assert_eq!("Montir".parse::<Role>().unwrap(), Role::Montir);
        assert_eq!(" pelanggan ".parse::<Role>().unwrap(), Role::Pelanggan);
        assert!("root".parse::<Role>().is_err());
    }
}
