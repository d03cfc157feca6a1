//! CompassIQ Server — Application entry point.
//!
//! Boots the storage layer: connects to SurrealDB, applies pending
//! migrations, and seeds the built-in template catalog. The HTTP/UI
//! tier runs in a separate deployment and consumes `compassiq-service`
//! directly.

use compassiq_db::repository::SurrealTemplateRepository;
use compassiq_db::{DbConfig, DbManager};
use compassiq_service::TemplateCatalog;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("compassiq=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting CompassIQ server...");

    if let Err(e) = run().await {
        tracing::error!(error = %e, "startup failed");
        std::process::exit(1);
    }

    tracing::info!("CompassIQ server bootstrap complete.");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = DbConfig::from_env();
    let manager = DbManager::connect(&config).await?;
    let db = manager.client().clone();

    compassiq_db::run_migrations(&db).await?;

    let catalog = TemplateCatalog::new(SurrealTemplateRepository::new(db));
    let seeded = catalog.seed_builtins().await?;
    tracing::info!(seeded, "built-in template catalog ready");

    Ok(())
}
