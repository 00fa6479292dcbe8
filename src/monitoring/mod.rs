//! Monitoring for both services
//!
//! Provides:
//! - Structured logging with tracing (console + optional rotated files)
//! - Prometheus metrics collection and text export
//! - Per-request trace middleware and the `RequestContext` extractor

pub mod config;
pub mod metrics;
pub mod trace_middleware;
pub mod tracing_config;

pub use config::{LogFormat, MonitoringConfig};
pub use metrics::export_prometheus;
pub use trace_middleware::{RequestContext, RequestTrace, REQUEST_ID_HEADER};
pub use tracing_config::init_tracing;

use actix_web::HttpResponse;

/// GET /metrics in Prometheus text format
pub async fn metrics_handler() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4; charset=utf-8")
        .body(export_prometheus())
}
