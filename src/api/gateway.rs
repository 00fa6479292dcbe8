//! Public gateway: authenticates, validates uploads and forwards them to the
//! ingestion service.

use std::net::TcpListener;

use actix_cors::Cors;
use actix_multipart::Multipart;
use actix_web::dev::Server;
use actix_web::http::header::ContentType;
use actix_web::{web, App, HttpResponse, HttpServer};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::{io_error, HealthResponse};
use crate::auth::ApiKeyAuth;
use crate::config::GatewayConfig;
use crate::errors::ApiResult;
use crate::monitoring::{metrics_handler, RequestContext, RequestTrace, REQUEST_ID_HEADER};
use crate::multipart::read_upload;
use crate::upstream::IngestionClient;
use crate::validation::{check_size, check_upload_name};

pub const SERVICE_NAME: &str = "api-gateway";
pub const DISPLAY_NAME: &str = "Research Copilot";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InfoResponse {
    pub name: String,
    pub version: String,
}

#[derive(Clone)]
pub struct GatewayState {
    pub config: GatewayConfig,
    pub client: IngestionClient,
}

impl GatewayState {
    pub fn new(config: GatewayConfig) -> std::io::Result<Self> {
        let client = IngestionClient::new(config.ingestion_url.clone(), config.upstream_timeout)
            .map_err(io_error)?;
        Ok(Self { config, client })
    }
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse::ok(SERVICE_NAME))
}

pub async fn info() -> HttpResponse {
    HttpResponse::Ok().json(InfoResponse {
        name: DISPLAY_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /upload
///
/// The filename is checked before the body is read; the body read stops as
/// soon as it passes `max_upload_bytes`. On success the ingestion response is
/// relayed unchanged.
pub async fn upload(
    state: web::Data<GatewayState>,
    ctx: RequestContext,
    mut payload: Multipart,
) -> ApiResult<HttpResponse> {
    let config = &state.config;

    let upload = read_upload(&mut payload, Some(config.max_upload_bytes), |name| {
        check_upload_name(name, &config.allowed_extensions)
    })
    .await
    .map_err(|e| {
        warn!(request_id = %ctx.request_id, error = %e, "upload rejected");
        e
    })?;

    if let Err(e) = check_size(upload.len(), config.max_upload_bytes) {
        warn!(
            request_id = %ctx.request_id,
            filename = %upload.filename,
            error = %e,
            "upload rejected"
        );
        return Err(e);
    }

    info!(
        request_id = %ctx.request_id,
        filename = %upload.filename,
        bytes = upload.len(),
        "upload accepted"
    );

    let reply = state.client.process_pdf(&ctx, upload).await?;
    Ok(HttpResponse::build(reply.status)
        .insert_header(ContentType::json())
        .body(reply.body))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/info", web::get().to(info))
        .route("/metrics", web::get().to(metrics_handler))
        .route("/upload", web::post().to(upload));
}

fn cors(config: &GatewayConfig) -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec!["content-type".to_string(), config.api_key_header.clone()])
        .expose_headers(vec![REQUEST_ID_HEADER])
        .max_age(3600)
}

/// Serve the gateway on an already bound listener.
pub fn run_gateway_server(config: GatewayConfig, listener: TcpListener) -> std::io::Result<Server> {
    let state = web::Data::new(GatewayState::new(config)?);
    let addr = listener.local_addr()?;

    info!(
        addr = %addr,
        ingestion_url = %state.config.ingestion_url,
        max_upload_bytes = state.config.max_upload_bytes,
        allowed = %state.config.allowed_extensions.join(","),
        timeout_secs = state.config.upstream_timeout.as_secs(),
        "starting gateway"
    );

    let server = HttpServer::new(move || {
        let config = &state.config;
        App::new()
            .app_data(state.clone())
            .wrap(ApiKeyAuth::new(
                config.api_key_header.clone(),
                config.api_key.clone(),
            ))
            .wrap(RequestTrace::new(SERVICE_NAME))
            .wrap(cors(config))
            .configure(configure)
    })
    .listen(listener)?
    .run();

    Ok(server)
}

pub fn start_gateway_server(config: GatewayConfig) -> std::io::Result<Server> {
    let listener = TcpListener::bind(config.bind_addr())?;
    run_gateway_server(config, listener)
}
