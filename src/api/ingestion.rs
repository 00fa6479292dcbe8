//! Ingestion service: PDF in, chunks out, one metadata row per document.

use std::fmt::Display;
use std::net::TcpListener;
use std::sync::Arc;

use actix_multipart::Multipart;
use actix_web::dev::Server;
use actix_web::{web, App, HttpResponse, HttpServer};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::api::HealthResponse;
use crate::chunker::{Chunk, Chunker};
use crate::db::documents::{Document, DocumentStore, NewDocument};
use crate::errors::{ApiError, ApiResult};
use crate::extract::PageExtractor;
use crate::monitoring::{metrics, metrics_handler, RequestContext, RequestTrace};
use crate::multipart::read_upload;
use crate::validation::is_pdf_filename;

pub const SERVICE_NAME: &str = "ingestion-service";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessPdfResponse {
    pub document_id: i64,
    pub filename: String,
    pub total_pages: usize,
    pub total_chunks: usize,
    pub chunks: Vec<Chunk>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentListItem {
    pub id: i64,
    pub filename: String,
    pub total_pages: i64,
    pub total_chunks: i64,
    pub uploaded_at: String,
}

impl From<Document> for DocumentListItem {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id,
            filename: doc.filename,
            total_pages: doc.total_pages,
            total_chunks: doc.total_chunks,
            uploaded_at: doc.uploaded_at.to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }
}

#[derive(Clone)]
pub struct IngestionState {
    pub chunker: Chunker,
    pub store: Arc<DocumentStore>,
    pub extractor: Arc<dyn PageExtractor>,
}

impl IngestionState {
    pub fn new(chunker: Chunker, store: DocumentStore, extractor: impl PageExtractor + 'static) -> Self {
        Self {
            chunker,
            store: Arc::new(store),
            extractor: Arc::new(extractor),
        }
    }
}

/// Log the cause, count it, hand the client only the generic message.
fn processing_failure(ctx: &RequestContext, stage: &str, err: impl Display) -> ApiError {
    error!(request_id = %ctx.request_id, stage, error = %err, "PDF processing failed");
    metrics::record_ingestion_failure(stage);
    ApiError::ProcessingFailure
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse::ok(SERVICE_NAME))
}

/// POST /process_pdf
pub async fn process_pdf(
    state: web::Data<IngestionState>,
    ctx: RequestContext,
    mut payload: Multipart,
) -> ApiResult<HttpResponse> {
    let upload = read_upload(&mut payload, None, |name| match name {
        Some(name) if is_pdf_filename(name) => Ok(name.to_string()),
        _ => Err(ApiError::ValidationError("Only PDF files are allowed".into())),
    })
    .await
    .map_err(|e| {
        warn!(request_id = %ctx.request_id, error = %e, "upload rejected");
        e
    })?;

    info!(
        request_id = %ctx.request_id,
        filename = %upload.filename,
        bytes = upload.len(),
        "processing PDF"
    );

    let extractor = Arc::clone(&state.extractor);
    let chunker = state.chunker;
    let data = upload.data;
    let (total_pages, chunks) = web::block(move || {
        extractor.extract(&data).map(|text| {
            let chunks = chunker.chunks(&text.combined());
            (text.page_count(), chunks)
        })
    })
    .await
    .map_err(|e| processing_failure(&ctx, "extract", e))?
    .map_err(|e| processing_failure(&ctx, "extract", e))?;

    let store = Arc::clone(&state.store);
    let filename = upload.filename.clone();
    let total_chunks = chunks.len();
    let document = web::block(move || {
        store.insert(&NewDocument {
            filename: &filename,
            total_pages,
            total_chunks,
        })
    })
    .await
    .map_err(|e| processing_failure(&ctx, "persist", e))?
    .map_err(|e| processing_failure(&ctx, "persist", e))?;

    metrics::observe_ingested_document(total_chunks);
    info!(
        request_id = %ctx.request_id,
        document_id = document.id,
        filename = %document.filename,
        total_pages,
        total_chunks,
        "PDF processed"
    );

    Ok(HttpResponse::Ok().json(ProcessPdfResponse {
        document_id: document.id,
        filename: document.filename,
        total_pages,
        total_chunks,
        chunks,
    }))
}

/// GET /documents, newest first.
pub async fn list_documents(
    state: web::Data<IngestionState>,
    ctx: RequestContext,
) -> ApiResult<HttpResponse> {
    let store = Arc::clone(&state.store);
    let documents = web::block(move || store.list())
        .await?
        .map_err(|e| {
            error!(request_id = %ctx.request_id, error = %e, "failed to list documents");
            ApiError::Internal
        })?;

    let items: Vec<DocumentListItem> = documents.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(items))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/metrics", web::get().to(metrics_handler))
        .route("/documents", web::get().to(list_documents))
        .route("/process_pdf", web::post().to(process_pdf));
}

/// Serve the ingestion API on an already bound listener.
pub fn run_ingestion_server(state: IngestionState, listener: TcpListener) -> std::io::Result<Server> {
    let addr = listener.local_addr()?;
    info!(
        addr = %addr,
        chunk_size = state.chunker.chunk_size(),
        chunk_overlap = state.chunker.overlap(),
        "starting ingestion service"
    );

    let state = web::Data::new(state);
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(RequestTrace::new(SERVICE_NAME))
            .configure(configure)
    })
    .listen(listener)?
    .run();

    Ok(server)
}
