use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use damage_inspect::{
    adapters::{
        http::{router, state::HttpState},
        onnx::{detector::OnnxDetector, model_catalog::OnnxModelCatalog},
        pricing::toml_catalog::TomlPriceCatalog,
        sqlite::SqliteStore,
    },
    application::{ports::ModelCatalogPort, services::InspectionService},
    config::{Command, SeedArgs, Settings},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logs (RUST_LOG=info por defecto)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::parse();
    if let Some(Command::Seed(args)) = &settings.command {
        return seed(&settings.database_url, args).await;
    }

    tracing::info!("🔧 Inicializando adaptadores de infraestructura...");

    // 2. Modelo: validar y cargar una sola vez; a partir de aquí es inmutable.
    let inference = settings.inference();
    OnnxModelCatalog::new().validate_model(&inference.model).await?;
    let detector = tokio::task::spawn_blocking(move || OnnxDetector::load(inference))
        .await
        .context("carga del modelo abortada")??;

    // 3. Catálogo de precios y almacenamiento
    let pricing = match &settings.prices {
        Some(path) => TomlPriceCatalog::load(path)?,
        None => {
            tracing::warn!("Sin catálogo de precios: todas las estimaciones saldrán como no disponibles");
            TomlPriceCatalog::empty()
        }
    };
    tracing::info!("💰 Catálogo de precios con {} entradas", pricing.len());

    let store = Arc::new(SqliteStore::connect(&settings.database_url).await?);

    // 4. Servicio (caso de uso) y estado HTTP
    let inspection = Arc::new(InspectionService::new(
        Arc::new(detector),
        Arc::new(pricing),
        store.clone(),
        store.clone(),
        settings.confidence_threshold,
    ));
    let state = HttpState { inspection, sessions: store.clone() };

    // 5. Lanzar el servidor
    let app = router(state, settings.max_upload_bytes);
    let listener = tokio::net::TcpListener::bind(&settings.bind)
        .await
        .with_context(|| format!("no se pudo escuchar en {}", settings.bind))?;
    tracing::info!("🚀 Servidor de inspección iniciado en http://{}", settings.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Apagando...");
        })
        .await?;

    store.close().await;
    Ok(())
}

/// Alta de cuentas para operadores; imprime el token emitido por stdout.
async fn seed(database_url: &str, args: &SeedArgs) -> anyhow::Result<()> {
    let store = SqliteStore::connect(database_url).await?;
    let vehicle = args.vehicle();
    let (user_id, token) = store
        .seed_account(&args.username, &args.nama_lengkap, args.role, vehicle.as_ref())
        .await?;
    tracing::info!(user_id, role = args.role.as_str(), vehicle = vehicle.is_some(), "👤 Cuenta creada");
    println!("{token}");
    store.close().await;
    Ok(())
}
