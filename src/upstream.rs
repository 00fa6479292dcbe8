// src/upstream.rs
//! HTTP client for the ingestion service.
//!
//! One request per upload, bounded by the configured timeout. Nothing is
//! retried; a failure is reported to the caller straight away.

use std::time::Duration;

use actix_web::http::StatusCode;
use reqwest::multipart::{Form, Part};
use tracing::{error, info, warn};

use crate::errors::{ApiError, ErrorBody};
use crate::monitoring::metrics;
use crate::monitoring::RequestContext;
use crate::multipart::{Upload, FILE_FIELD};

pub const PROCESS_PDF_PATH: &str = "/process_pdf";
const UPSTREAM_ERROR_DETAIL: &str = "Ingestion service error";

/// A successful (2xx) ingestion response, relayed as-is.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

#[derive(Clone)]
pub struct IngestionClient {
    http: reqwest::Client,
    base_url: String,
}

impl IngestionClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn process_pdf(
        &self,
        ctx: &RequestContext,
        upload: Upload,
    ) -> Result<UpstreamReply, ApiError> {
        let url = format!("{}{}", self.base_url, PROCESS_PDF_PATH);
        let size = upload.len();
        let part = Part::bytes(upload.data)
            .file_name(upload.filename.clone())
            .mime_str("application/pdf")
            .map_err(|e| {
                error!(request_id = %ctx.request_id, error = %e, "failed to build multipart part");
                ApiError::Internal
            })?;
        let form = Form::new().part(FILE_FIELD, part);

        info!(
            request_id = %ctx.request_id,
            filename = %upload.filename,
            bytes = size,
            url = %url,
            "forwarding upload to ingestion service"
        );

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport_error(ctx, &e))?;

        let status = StatusCode::from_u16(response.status().as_u16())
            .unwrap_or(StatusCode::BAD_GATEWAY);
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(ctx, &e))?
            .to_vec();

        if status.is_success() {
            metrics::UPLOADS_FORWARDED_TOTAL.inc();
            return Ok(UpstreamReply { status, body });
        }

        let detail = sanitized_detail(status, &body);
        warn!(
            request_id = %ctx.request_id,
            status = status.as_u16(),
            detail = %detail,
            "ingestion service returned an error"
        );
        metrics::record_upstream_failure("status");
        Err(ApiError::UpstreamError { status, detail })
    }
}

/// Map a transport failure: timeouts to 504, anything else (refused, reset, DNS) to 503.
fn transport_error(ctx: &RequestContext, err: &reqwest::Error) -> ApiError {
    if err.is_timeout() {
        error!(request_id = %ctx.request_id, error = %err, "ingestion service timed out");
        metrics::record_upstream_failure("timeout");
        ApiError::UpstreamTimeout
    } else {
        error!(request_id = %ctx.request_id, error = %err, "ingestion service unreachable");
        metrics::record_upstream_failure("unavailable");
        ApiError::UpstreamUnavailable
    }
}

/// Client errors keep the upstream `detail` (already written for clients);
/// server errors and unparseable bodies get a fixed message.
pub fn sanitized_detail(status: StatusCode, body: &[u8]) -> String {
    if status.is_client_error() {
        if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
            if !parsed.detail.trim().is_empty() {
                return parsed.detail;
            }
        }
    }
    UPSTREAM_ERROR_DETAIL.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_detail_is_relayed() {
        let body = br#"{"detail":"Only PDF files are allowed"}"#;
        assert_eq!(
            sanitized_detail(StatusCode::BAD_REQUEST, body),
            "Only PDF files are allowed"
        );
    }

    #[test]
    fn test_server_error_detail_is_replaced() {
        let body = br#"{"detail":"Traceback: sqlite3.OperationalError"}"#;
        assert_eq!(
            sanitized_detail(StatusCode::INTERNAL_SERVER_ERROR, body),
            UPSTREAM_ERROR_DETAIL
        );
    }

    #[test]
    fn test_unparseable_body_is_replaced() {
        assert_eq!(
            sanitized_detail(StatusCode::NOT_FOUND, b"<html>nope</html>"),
            UPSTREAM_ERROR_DETAIL
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = IngestionClient::new("http://ingestion:8001/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://ingestion:8001");
    }
}
