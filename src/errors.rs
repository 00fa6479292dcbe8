// src/errors.rs
//! Error taxonomy shared by the gateway and the ingestion service.
//!
//! Handlers return `Result<_, ApiError>`; actix turns the error into a status
//! code and a `{"detail": "..."}` body through the `ResponseError` impl below.
//! Messages on 5xx variants are fixed strings so internal failure text never
//! reaches a client. Callers log the underlying cause before converting.

use actix_web::http::header::{HeaderValue, WWW_AUTHENTICATE};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chunker::ChunkError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    AuthMissing(String),

    #[error("Invalid API key")]
    AuthInvalid,

    #[error("{0}")]
    ValidationError(String),

    #[error("File too large. Maximum size is {max_bytes} bytes")]
    PayloadTooLarge { max_bytes: usize },

    #[error("Ingestion service timed out")]
    UpstreamTimeout,

    #[error("Ingestion service unavailable")]
    UpstreamUnavailable,

    #[error("{detail}")]
    UpstreamError { status: StatusCode, detail: String },

    #[error("PDF processing failed")]
    ProcessingFailure,

    /// Carries the chunker's reason for logs; clients only see the fixed text.
    #[error("Invalid chunking configuration")]
    InvalidArgument(String),

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::AuthMissing(_) => "auth_missing",
            ApiError::AuthInvalid => "auth_invalid",
            ApiError::ValidationError(_) => "validation",
            ApiError::PayloadTooLarge { .. } => "payload_too_large",
            ApiError::UpstreamTimeout => "upstream_timeout",
            ApiError::UpstreamUnavailable => "upstream_unavailable",
            ApiError::UpstreamError { .. } => "upstream_error",
            ApiError::ProcessingFailure => "processing_failure",
            ApiError::InvalidArgument(_) => "invalid_argument",
            ApiError::Internal => "internal",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::AuthMissing(_) => StatusCode::UNAUTHORIZED,
            ApiError::AuthInvalid => StatusCode::FORBIDDEN,
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            ApiError::UpstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::UpstreamError { status, .. } => *status,
            // Chunker preconditions come from server config, never from the client.
            ApiError::InvalidArgument(_) | ApiError::ProcessingFailure | ApiError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if matches!(self, ApiError::AuthMissing(_)) {
            builder.insert_header((WWW_AUTHENTICATE, HeaderValue::from_static("ApiKey")));
        }
        builder.json(ErrorBody {
            detail: self.to_string(),
        })
    }
}

impl From<ChunkError> for ApiError {
    fn from(err: ChunkError) -> Self {
        match err {
            ChunkError::InvalidArgument(msg) => {
                tracing::error!(reason = %msg, "chunker rejected its arguments");
                ApiError::InvalidArgument(msg)
            }
        }
    }
}

impl From<actix_web::error::BlockingError> for ApiError {
    fn from(err: actix_web::error::BlockingError) -> Self {
        tracing::error!(error = %err, "blocking task was cancelled");
        ApiError::Internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::AuthMissing("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::AuthInvalid.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::PayloadTooLarge { max_bytes: 1 }.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ApiError::UpstreamTimeout.status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ApiError::UpstreamUnavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::UpstreamError {
                status: StatusCode::BAD_GATEWAY,
                detail: "x".into()
            }
            .status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::ProcessingFailure.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_web::test]
    async fn test_error_body_shape() {
        let resp = ApiError::ProcessingFailure.error_response();
        let body = to_bytes(resp.into_body()).await.unwrap();
        let parsed: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.detail, "PDF processing failed");
    }

    #[test]
    fn test_auth_missing_sets_challenge_header() {
        let resp = ApiError::AuthMissing("API key required".into()).error_response();
        assert_eq!(
            resp.headers().get(WWW_AUTHENTICATE).unwrap(),
            HeaderValue::from_static("ApiKey")
        );
    }

    #[test]
    fn test_chunk_error_maps_to_invalid_argument() {
        let err: ApiError = ChunkError::InvalidArgument("bad".into()).into();
        assert!(matches!(err, ApiError::InvalidArgument(_)));
        assert_eq!(err.kind(), "invalid_argument");
    }

    #[actix_web::test]
    async fn test_invalid_argument_body_hides_reason() {
        let err: ApiError =
            ChunkError::InvalidArgument("overlap (1000) must be smaller than chunk_size (1000)".into())
                .into();
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(resp.into_body()).await.unwrap();
        let parsed: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.detail, "Invalid chunking configuration");
        assert!(!parsed.detail.contains("overlap"));
    }
}
