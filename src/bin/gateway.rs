use research_copilot::api::gateway::start_gateway_server;
use research_copilot::config::GatewayConfig;
use research_copilot::monitoring::{self, metrics, MonitoringConfig};
use tracing::{error, info, warn};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    let monitoring_config = MonitoringConfig::from_env();
    let _log_guard = monitoring::init_tracing(&monitoring_config, "gateway.log")?;
    metrics::init();

    let config = match GatewayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid gateway configuration");
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    if config.uses_default_api_key() {
        warn!(
            header = %config.api_key_header,
            "API_KEY is not set; using the development default key"
        );
    }

    info!(addr = %config.bind_addr(), "gateway listening");
    start_gateway_server(config)?.await
}
