use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::application::ports::PriceCatalogPort;
use crate::domain::damage::{DamageType, PriceRange, Severity};

#[derive(Debug, Deserialize)]
struct PriceFile {
    #[serde(default)]
    harga: Vec<PriceEntry>,
}

#[derive(Debug, Deserialize)]
struct PriceEntry {
    tipe: DamageType,
    tingkat: Severity,
    min: i64,
    max: i64,
}

/// Catálogo de precios en memoria, cargado una vez al arrancar e inmutable después.
#[derive(Debug, Default, Clone)]
pub struct TomlPriceCatalog {
    prices: HashMap<(DamageType, Severity), PriceRange>,
}

impl TomlPriceCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: PriceFile = toml::from_str(content).context("catálogo de precios mal formado")?;
        let mut prices = HashMap::new();
        for e in file.harga {
            if e.min < 0 || e.min > e.max {
                bail!("rango inválido para {} / {}: {}..{}", e.tipe, e.tingkat, e.min, e.max);
            }
            let range = PriceRange { min: e.min, max: e.max };
            if prices.insert((e.tipe, e.tingkat), range).is_some() {
                bail!("entrada duplicada para {} / {}", e.tipe, e.tingkat);
            }
        }
        Ok(Self { prices })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("no se pudo leer {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl PriceCatalogPort for TomlPriceCatalog {
    fn lookup_price(&self, damage_type: DamageType, severity: Severity) -> Option<PriceRange> {
        self.prices.get(&(damage_type, severity)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [[harga]]
        tipe = "retak"
        tingkat = "Rusak Sedang"
        min = 300000
        max = 900000

        [[harga]]
        tipe = "pecah kaca"
        tingkat = "Rusak Berat"
        min = 1500000
        max = 4000000
    "#;

    #[test]
    fn looks_up_known_pairs() {
        let cat = TomlPriceCatalog::from_toml_str(SAMPLE).unwrap();
        assert_eq!(cat.len(), 2);
        assert_eq!(
            cat.lookup_price(DamageType::Retak, Severity::RusakSedang),
            Some(PriceRange { min: 300_000, max: 900_000 })
        );
        assert_eq!(cat.lookup_price(DamageType::Retak, Severity::RusakBerat), None);
        assert_eq!(cat.lookup_price(DamageType::Goresan, Severity::RusakRingan), None);
    }

    #[test]
    fn rejects_duplicates_and_inverted_ranges() {
        let dup = format!("{SAMPLE}\n[[harga]]\ntipe = \"retak\"\ntingkat = \"Rusak Sedang\"\nmin = 1\nmax = 2\n");
        assert!(TomlPriceCatalog::from_toml_str(&dup).is_err());

        let inverted = "[[harga]]\ntipe = \"goresan\"\ntingkat = \"Rusak Ringan\"\nmin = 10\nmax = 5\n";
        assert!(TomlPriceCatalog::from_toml_str(inverted).is_err());
    }

    #[test]
    fn rejects_unknown_labels() {
        let bad = "[[harga]]\ntipe = \"karat\"\ntingkat = \"Rusak Ringan\"\nmin = 1\nmax = 2\n";
        assert!(TomlPriceCatalog::from_toml_str(bad).is_err());
    }

    #[test]
    fn bundled_catalog_parses() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/prices.toml");
        let cat = TomlPriceCatalog::load(path).unwrap();
        for t in DamageType::ALL {
            assert!(cat.lookup_price(t, t.severity()).is_some(), "sin precio para {t}");
        }
    }
}
