#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use damage_inspect::adapters::{pricing::toml_catalog::TomlPriceCatalog, sqlite::SqliteStore};
use damage_inspect::application::{ports::DetectorPort, services::InspectionService};
use damage_inspect::domain::{
    detection::Detection,
    errors::DomainResult,
    identity::{Identity, Role, VehicleSnapshot},
};
use image::{DynamicImage, ImageBuffer, Rgb};

/// Detector de pruebas: devuelve siempre las mismas detecciones y cuenta llamadas.
pub struct StubDetector {
    detections: Vec<Detection>,
    calls: AtomicUsize,
}

impl StubDetector {
    pub fn new(detections: Vec<Detection>) -> Arc<Self> {
        Arc::new(Self { detections, calls: AtomicUsize::new(0) })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DetectorPort for StubDetector {
    fn detect(&self, _image: &DynamicImage) -> DomainResult<Vec<Detection>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.detections.clone())
    }
}

pub fn det(class_id: usize, score: f32) -> Detection {
    Detection { x1: 20.0, y1: 30.0, x2: 120.0, y2: 90.0, score, class_id }
}

/// retak 0.9, retak 0.3, penyok 0.6
pub fn scenario_detections() -> Vec<Detection> {
    vec![det(0, 0.9), det(0, 0.3), det(1, 0.6)]
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| Rgb([(x % 255) as u8, (y % 255) as u8, 90u8]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("Failed to encode test image");
    buf.into_inner()
}

pub fn bundled_prices() -> TomlPriceCatalog {
    TomlPriceCatalog::load(concat!(env!("CARGO_MANIFEST_DIR"), "/config/prices.toml"))
        .expect("Failed to load bundled price catalog")
}

pub struct Fixture {
    pub store: Arc<SqliteStore>,
    pub identity: Identity,
    pub token: String,
}

/// Usuario `pelanggan` con vehículo y sesión.
pub async fn customer_with_vehicle() -> anyhow::Result<Fixture> {
    let store = Arc::new(SqliteStore::in_memory().await?);
    let user_id = store.create_user("budi", "Budi Santoso", Role::Pelanggan).await?;
    store
        .register_vehicle(
            user_id,
            &VehicleSnapshot {
                plat_nomor: "B 1234 XYZ".into(),
                model_kendaraan: "Avanza".into(),
                tahun_kendaraan: 2019,
            },
        )
        .await?;
    let token = store.issue_session(user_id).await?;
    Ok(Fixture { store, identity: Identity { user_id, role: Role::Pelanggan }, token })
}

/// Simula una caída del almacenamiento: cualquier insert de resultados aborta.
pub async fn break_detection_inserts(store: &SqliteStore) -> anyhow::Result<()> {
    sqlx::query(
        r#"CREATE TRIGGER simulated_outage BEFORE INSERT ON detection_results
        BEGIN SELECT RAISE(ABORT, 'storage unavailable'); END"#,
    )
    .execute(store.pool())
    .await?;
    Ok(())
}

pub fn service(detector: Arc<StubDetector>, store: Arc<SqliteStore>) -> InspectionService {
    InspectionService::new(detector, Arc::new(bundled_prices()), store.clone(), store, 0.5)
}
