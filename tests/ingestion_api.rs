mod common;

use actix_web::{http::StatusCode, test, web, App};
use research_copilot::api::ingestion::{self, DocumentListItem, ProcessPdfResponse};
use research_copilot::api::HealthResponse;
use research_copilot::errors::ErrorBody;

use common::{ingestion_state, upload_request, FailingExtractor, StubExtractor, FAILURE_REASON};

macro_rules! ingestion_app {
    ($extractor:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(ingestion_state($extractor)))
                .configure(ingestion::configure),
        )
        .await
    };
}

fn stub(pages: &[&str]) -> StubExtractor {
    StubExtractor::with_pages(pages)
}

#[actix_web::test]
async fn test_health() {
    let app = ingestion_app!(stub(&[]));
    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: HealthResponse = test::read_body_json(resp).await;
    assert_eq!(body, HealthResponse::ok("ingestion-service"));
}

#[actix_web::test]
async fn test_non_pdf_rejected() {
    let app = ingestion_app!(stub(&["text"]));
    let req = upload_request("/process_pdf", Some("notes.txt"), b"hello").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = test::read_body_json(resp).await;
    assert_eq!(body.detail, "Only PDF files are allowed");
}

#[actix_web::test]
async fn test_upper_case_extension_rejected() {
    let app = ingestion_app!(stub(&["text"]));
    let req = upload_request("/process_pdf", Some("paper.PDF"), b"%PDF-1.4").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = test::read_body_json(resp).await;
    assert_eq!(body.detail, "Only PDF files are allowed");
}

#[actix_web::test]
async fn test_missing_file_field() {
    let app = ingestion_app!(stub(&["text"]));
    let req = test::TestRequest::post()
        .uri("/process_pdf")
        .insert_header((
            actix_web::http::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", common::BOUNDARY),
        ))
        .set_payload(common::multipart_body("attachment", Some("a.pdf"), b"%PDF"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = test::read_body_json(resp).await;
    assert_eq!(body.detail, "No file provided");
}

#[actix_web::test]
async fn test_process_pdf_joins_text_pages() {
    let app = ingestion_app!(stub(&["First page.", "", "Third page."]));
    let req = upload_request("/process_pdf", Some("paper.pdf"), b"%PDF-1.4 fake").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: ProcessPdfResponse = test::read_body_json(resp).await;
    assert_eq!(body.filename, "paper.pdf");
    // The blank page contributes nothing.
    assert_eq!(body.total_pages, 2);
    assert_eq!(body.total_chunks, 1);
    assert_eq!(body.chunks.len(), 1);
    assert_eq!(body.chunks[0].chunk_id, 0);
    assert_eq!(body.chunks[0].text, "First page. Third page.");
    assert_eq!(body.chunks[0].char_count, 23);
}

#[actix_web::test]
async fn test_process_pdf_long_text_chunks() {
    let long = "A".repeat(2500);
    let app = ingestion_app!(stub(&[long.as_str()]));
    let req = upload_request("/process_pdf", Some("long.pdf"), b"%PDF").to_request();
    let body: ProcessPdfResponse = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body.total_pages, 1);
    assert_eq!(body.total_chunks, 3);
    let counts: Vec<usize> = body.chunks.iter().map(|c| c.char_count).collect();
    assert_eq!(counts, vec![1000, 1000, 700]);
    let ids: Vec<usize> = body.chunks.iter().map(|c| c.chunk_id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
}

#[actix_web::test]
async fn test_pdf_without_text_yields_no_chunks() {
    let app = ingestion_app!(stub(&["", ""]));
    let req = upload_request("/process_pdf", Some("scan.pdf"), b"%PDF").to_request();
    let body: ProcessPdfResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.total_pages, 0);
    assert_eq!(body.total_chunks, 0);
    assert!(body.chunks.is_empty());
}

#[actix_web::test]
async fn test_reingest_creates_new_record_with_same_counts() {
    let text = "ABCDEFGHIJ".repeat(150);
    let app = ingestion_app!(stub(&[text.as_str(), "tail"]));

    let first: ProcessPdfResponse = test::call_and_read_body_json(
        &app,
        upload_request("/process_pdf", Some("same.pdf"), b"%PDF same").to_request(),
    )
    .await;
    let second: ProcessPdfResponse = test::call_and_read_body_json(
        &app,
        upload_request("/process_pdf", Some("same.pdf"), b"%PDF same").to_request(),
    )
    .await;

    assert_ne!(first.document_id, second.document_id);
    assert_eq!(first.total_pages, second.total_pages);
    assert_eq!(first.total_chunks, second.total_chunks);
    assert_eq!(first.chunks, second.chunks);
}

#[actix_web::test]
async fn test_documents_newest_first() {
    let app = ingestion_app!(stub(&["some text"]));
    for name in ["a.pdf", "b.pdf", "c.pdf"] {
        let resp = test::call_service(&app, upload_request("/process_pdf", Some(name), b"%PDF").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = test::call_service(&app, test::TestRequest::get().uri("/documents").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let docs: Vec<DocumentListItem> = test::read_body_json(resp).await;

    let names: Vec<&str> = docs.iter().map(|d| d.filename.as_str()).collect();
    assert_eq!(names, vec!["c.pdf", "b.pdf", "a.pdf"]);
    for doc in &docs {
        assert_eq!(doc.total_pages, 1);
        assert_eq!(doc.total_chunks, 1);
        assert!(doc.uploaded_at.ends_with('Z'), "{}", doc.uploaded_at);
        assert!(chrono::DateTime::parse_from_rfc3339(&doc.uploaded_at).is_ok());
    }
}

#[actix_web::test]
async fn test_extraction_failure_is_generic_500() {
    let app = ingestion_app!(FailingExtractor);
    let req = upload_request("/process_pdf", Some("broken.pdf"), b"not a pdf").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let raw = test::read_body(resp).await;
    let text = String::from_utf8_lossy(&raw);
    assert!(!text.contains(FAILURE_REASON));
    let body: ErrorBody = serde_json::from_slice(&raw).unwrap();
    assert_eq!(body.detail, "PDF processing failed");

    // Nothing was persisted.
    let docs: Vec<DocumentListItem> = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/documents").to_request(),
    )
    .await;
    assert!(docs.is_empty());
}

#[actix_web::test]
async fn test_metrics_endpoint() {
    let app = ingestion_app!(stub(&["x"]));
    let resp = test::call_service(&app, test::TestRequest::get().uri("/metrics").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
