use std::net::TcpListener;

use research_copilot::api::ingestion::{run_ingestion_server, IngestionState};
use research_copilot::config::IngestionConfig;
use research_copilot::db::documents::DocumentStore;
use research_copilot::extract::LopdfExtractor;
use research_copilot::monitoring::{self, metrics, MonitoringConfig};
use tracing::{error, info};

fn invalid(err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidInput, err.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    let monitoring_config = MonitoringConfig::from_env();
    let _log_guard = monitoring::init_tracing(&monitoring_config, "ingestion.log")?;
    metrics::init();

    let config = IngestionConfig::from_env().map_err(|e| {
        error!(error = %e, "invalid ingestion configuration");
        invalid(e)
    })?;
    let chunker = config.chunker().map_err(invalid)?;

    let store = DocumentStore::open(&config.database).map_err(|e| {
        error!(error = %e, database = ?config.database, "failed to open document store");
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;
    info!(database = ?config.database, "document store ready");

    let listener = TcpListener::bind(config.bind_addr())?;
    info!(addr = %config.bind_addr(), "ingestion service listening");

    let state = IngestionState::new(chunker, store, LopdfExtractor);
    run_ingestion_server(state, listener)?.await
}
