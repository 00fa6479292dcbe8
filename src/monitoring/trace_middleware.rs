use crate::monitoring::metrics::REQUEST_LATENCY_MS;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{self, HeaderName, HeaderValue},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::time::Instant;
use tracing::{info_span, Instrument};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Per-request logging context.
///
/// Created by [`RequestTrace`] and stored in the request extensions; handlers
/// receive it as an extractor and pass `request_id` to every log call.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl FromRequest for RequestContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Without the middleware (e.g. bare test apps) each call gets a fresh id.
        let ctx = req
            .extensions()
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default();
        ready(Ok(ctx))
    }
}

/// Assigns a request id, wraps the handler in an `http_request` span and
/// records latency per route.
pub struct RequestTrace {
    service: &'static str,
}

impl RequestTrace {
    pub fn new(service: &'static str) -> Self {
        Self { service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestTrace
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestTraceService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestTraceService {
            service,
            service_name: self.service,
        }))
    }
}

pub struct RequestTraceService<S> {
    service: S,
    service_name: &'static str,
}

impl<S, B> Service<ServiceRequest> for RequestTraceService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service_name = self.service_name;
        let method = req.method().to_string();
        let route_label = req
            .match_pattern()
            .unwrap_or_else(|| req.path().to_string());
        let user_agent = req
            .headers()
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let ctx = RequestContext::new();
        let request_id = ctx.request_id.clone();
        req.extensions_mut().insert(ctx);

        let span = info_span!(
            "http_request",
            service = service_name,
            method = %method,
            path = %route_label,
            request_id = %request_id,
            user_agent = %user_agent
        );

        let start = Instant::now();
        let fut = self.service.call(req);

        Box::pin(async move {
            let mut res = fut.instrument(span).await?;

            let status = res.status().as_u16();
            let duration_ms = start.elapsed().as_millis() as u64;
            let status_class = format!("{}xx", status / 100);

            REQUEST_LATENCY_MS
                .with_label_values(&[service_name, &method, &route_label, &status_class])
                .observe(duration_ms as f64);

            if let Ok(value) = HeaderValue::from_str(&request_id) {
                res.headers_mut()
                    .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
            }

            tracing::info!(
                service = service_name,
                method = %method,
                path = %route_label,
                status = status,
                duration_ms = duration_ms,
                request_id = %request_id,
                "request completed"
            );

            Ok(res)
        })
    }
}
