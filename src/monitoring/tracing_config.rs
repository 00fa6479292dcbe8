//! Structured logging with tracing
//!
//! Sets up:
//! - Console logging, text or JSON
//! - File logging with daily rotation (JSON), when a log directory is configured
//! - Env-filter driven log levels

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::daily;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use super::config::{LogFormat, MonitoringConfig};

/// Initialize the global tracing subscriber.
///
/// `file_prefix` names the rotated log files (e.g. `gateway.log`). The returned
/// guard must be held for the life of the process when file logging is on;
/// dropping it stops the background writer.
pub fn init_tracing(
    config: &MonitoringConfig,
    file_prefix: &str,
) -> std::io::Result<Option<WorkerGuard>> {
    config.ensure_log_dir()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let console = config.enable_console_logging;
    let text_console = (console && config.log_format == LogFormat::Text).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
    });
    let json_console = (console && config.log_format == LogFormat::Json).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .json()
            .with_current_span(true)
    });

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let (writer, guard) = tracing_appender::non_blocking(daily(dir, file_prefix));
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false) // No ANSI codes in files
                .json();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(text_console)
        .with(json_console)
        .with(file_layer)
        .try_init();

    Ok(guard)
}
