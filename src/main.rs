//! # Leadpipe CRM Main Entry Point
//!
//! This is the main entry point for the Leadpipe CRM service.

use leadpipe::migration::{Migrator, MigratorTrait};
use leadpipe::{config::ConfigLoader, db::init_pool, server::run_server, telemetry::init_tracing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from layered env files and variables
    let config_loader = ConfigLoader::new();
    let config = config_loader.load()?;

    init_tracing(&config);

    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!("Configuration: {}", redacted_json);
    }

    let db = init_pool(&config).await?;
    Migrator::up(&db, None).await?;

    run_server(config, db).await
}
