// src/auth.rs
//! Shared-secret header authentication for the gateway.
//!
//! Every request outside the public allow-list must carry the configured
//! header with a value equal (case-sensitive, exact) to the configured secret.
//! A missing or empty header is rejected with 401, a wrong value with 403.

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, ResponseError,
};
use futures_util::future::LocalBoxFuture;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::errors::ApiError;

/// Paths reachable without a key.
pub const PUBLIC_ENDPOINTS: &[&str] = &["/health", "/metrics", "/docs", "/openapi.json", "/redoc"];

/// Prefixes for documentation UI assets.
pub const PUBLIC_PREFIXES: &[&str] = &["/docs", "/redoc", "/openapi"];

pub fn is_public_endpoint(path: &str) -> bool {
    PUBLIC_ENDPOINTS.contains(&path) || PUBLIC_PREFIXES.iter().any(|p| path.starts_with(p))
}

/// Compare a presented key against the expected secret.
pub fn verify_api_key(presented: Option<&str>, expected: &str, header_name: &str) -> Result<(), ApiError> {
    match presented {
        None | Some("") => Err(ApiError::AuthMissing(format!(
            "API key required. Include '{}' header.",
            header_name
        ))),
        Some(key) if key == expected => Ok(()),
        Some(_) => Err(ApiError::AuthInvalid),
    }
}

#[derive(Clone)]
struct AuthSettings {
    header_name: String,
    api_key: Arc<str>,
}

/// Authentication middleware
pub struct ApiKeyAuth {
    settings: AuthSettings,
}

impl ApiKeyAuth {
    pub fn new(header_name: impl Into<String>, api_key: impl Into<String>) -> Self {
        let api_key: String = api_key.into();
        Self {
            settings: AuthSettings {
                header_name: header_name.into(),
                api_key: Arc::from(api_key),
            },
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ApiKeyAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = ApiKeyAuthService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(ApiKeyAuthService {
            service: Rc::new(service),
            settings: self.settings.clone(),
        }))
    }
}

pub struct ApiKeyAuthService<S> {
    service: Rc<S>,
    settings: AuthSettings,
}

impl<S, B> Service<ServiceRequest> for ApiKeyAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let path = req.path().to_string();

        if is_public_endpoint(&path) {
            debug!(path = %path, "Skipping auth for public endpoint");
        } else {
            // A value that is not valid UTF-8 cannot equal the secret; treat it as a wrong key.
            let presented = req
                .headers()
                .get(self.settings.header_name.as_str())
                .map(|v| v.to_str().unwrap_or("\u{fffd}"));

            if let Err(err) =
                verify_api_key(presented, &self.settings.api_key, &self.settings.header_name)
            {
                match err {
                    ApiError::AuthMissing(_) => warn!(path = %path, "Missing API key"),
                    _ => warn!(path = %path, "Invalid API key attempt"),
                }
                let resp = err.error_response();
                return Box::pin(async move { Ok(req.into_response(resp.map_into_right_body())) });
            }
            debug!(path = %path, "API key verified");
        }

        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}
