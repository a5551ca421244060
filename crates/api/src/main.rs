//! Telemetry Logger - Main Entry Point

use api::{config::Settings, init_logging, run_server};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_logging(&settings.logging);

    info!("=== Telemetry Logger v{} ===", env!("CARGO_PKG_VERSION"));
    info!(database = %settings.database.path, "Starting readings service...");

    run_server(settings).await
}
