#![allow(dead_code)]

use std::net::TcpListener;
use std::time::Duration;

use actix_web::http::header::CONTENT_TYPE;
use actix_web::test::TestRequest;
use research_copilot::api::ingestion::{run_ingestion_server, IngestionState};
use research_copilot::chunker::Chunker;
use research_copilot::config::GatewayConfig;
use research_copilot::db::documents::DocumentStore;
use research_copilot::extract::{ExtractError, ExtractedText, PageExtractor, PageText};

pub const BOUNDARY: &str = "----research-copilot-test-boundary";
pub const API_KEY: &str = "test-secret";
pub const API_KEY_HEADER: &str = "X-API-Key";

/// One multipart part. `filename: None` leaves the attribute out.
pub fn multipart_body(field: &str, filename: Option<&str>, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    match filename {
        Some(name) => body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, name
            )
            .as_bytes(),
        ),
        None => body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n", field).as_bytes(),
        ),
    }
    body.extend_from_slice(b"Content-Type: application/pdf\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn upload_request(uri: &str, filename: Option<&str>, content: &[u8]) -> TestRequest {
    TestRequest::post()
        .uri(uri)
        .insert_header((
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(multipart_body("file", filename, content))
}

/// Returns fixed pages regardless of the bytes it is given.
pub struct StubExtractor {
    pages: Vec<String>,
}

impl StubExtractor {
    pub fn with_pages(pages: &[&str]) -> Self {
        Self {
            pages: pages.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl PageExtractor for StubExtractor {
    fn extract(&self, _bytes: &[u8]) -> Result<ExtractedText, ExtractError> {
        Ok(ExtractedText::from_pages(
            self.pages.iter().enumerate().map(|(i, text)| PageText {
                page: i as u32 + 1,
                text: text.clone(),
            }),
        ))
    }
}

/// Always fails with a message that must never reach a client.
pub struct FailingExtractor;

pub const FAILURE_REASON: &str = "xref table corrupt at offset 4711";

impl PageExtractor for FailingExtractor {
    fn extract(&self, _bytes: &[u8]) -> Result<ExtractedText, ExtractError> {
        Err(ExtractError::Parse(FAILURE_REASON.to_string()))
    }
}

pub fn ingestion_state(extractor: impl PageExtractor + 'static) -> IngestionState {
    IngestionState::new(
        Chunker::default(),
        DocumentStore::open_in_memory().expect("in-memory store"),
        extractor,
    )
}

/// Start a real ingestion server on an ephemeral port; returns its base URL.
pub fn spawn_ingestion(extractor: impl PageExtractor + 'static) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ingestion listener");
    let port = listener.local_addr().unwrap().port();
    let server = run_ingestion_server(ingestion_state(extractor), listener)
        .expect("start ingestion server");
    actix_web::rt::spawn(server);
    format!("http://127.0.0.1:{}", port)
}

/// A port nothing listens on.
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

/// Accepts connections and never answers.
pub async fn silent_server_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let port = listener.local_addr().unwrap().port();
    actix_web::rt::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    format!("http://127.0.0.1:{}", port)
}

pub fn gateway_config(ingestion_url: &str) -> GatewayConfig {
    GatewayConfig {
        host: "127.0.0.1".into(),
        port: 0,
        api_key: API_KEY.into(),
        api_key_header: API_KEY_HEADER.into(),
        ingestion_url: ingestion_url.into(),
        max_upload_bytes: 1024,
        allowed_extensions: vec![".pdf".into()],
        upstream_timeout: Duration::from_secs(5),
    }
}
