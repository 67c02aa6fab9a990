//! Binary entry point: resolve configuration, open the report store, wire the
//! pipeline to the AI gateway and serve the HTTP API until Ctrl-C.

use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use carbaudit::api::{start_api_server, ApiContext};
use carbaudit::config::{self, AppConfig};
use carbaudit::db::sqlite::open_database;
use carbaudit::pipeline::{AiGatewayClient, AuditProcessor};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("Carbaudit starting v{}", config::APP_VERSION);

    if let Err(e) = run().await {
        tracing::error!("Carbaudit failed to start: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = open_database(&config.db_path)?;
    let db = Arc::new(Mutex::new(conn));
    tracing::info!(path = %config.db_path.display(), "Report store ready");

    let client = Arc::new(AiGatewayClient::from_config(&config));
    let processor = Arc::new(AuditProcessor::new(client, db.clone()));
    let ctx = ApiContext::new(processor, db);

    let mut server = start_api_server(ctx, config.bind_addr).await?;
    tracing::info!(addr = %server.addr(), model = %config.model, "Carbaudit API listening");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");
    server.shutdown();
    server.wait().await;

    Ok(())
}
