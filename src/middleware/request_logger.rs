//! Request logging middleware.
//!
//! Webhook deliveries are additionally tagged with their GitHub event name
//! and delivery id so a delivery can be traced from GitHub's delivery log.

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};
use std::time::Instant;
use tracing::{info, warn};

use crate::config::{DELIVERY_HEADER, EVENT_HEADER};

/// Request logger middleware factory.
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggerMiddleware { service }))
    }
}

pub struct RequestLoggerMiddleware<S> {
    service: S,
}

fn header(req: &ServiceRequest, name: &str) -> String {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string()
}

impl<S, B> Service<ServiceRequest> for RequestLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();
        let remote_addr = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();
        let github_event = header(&req, EVENT_HEADER);
        let delivery = header(&req, DELIVERY_HEADER);

        info!(
            target: "api",
            method = %method,
            path = %path,
            query = %req.query_string(),
            remote_addr = %remote_addr,
            github_event = %github_event,
            delivery = %delivery,
            "→ Request started"
        );

        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            let duration_ms = start.elapsed().as_millis();
            let status = res.status();

            if status.is_success() || status.is_redirection() {
                info!(
                    target: "api",
                    method = %method,
                    path = %path,
                    status = status.as_u16(),
                    duration_ms = %duration_ms,
                    "← Request completed"
                );
            } else {
                let kind = if status.is_client_error() {
                    "Client error"
                } else {
                    "Server error"
                };
                warn!(
                    target: "api",
                    method = %method,
                    path = %path,
                    status = status.as_u16(),
                    duration_ms = %duration_ms,
                    github_event = %github_event,
                    delivery = %delivery,
                    "← {}", kind
                );
            }

            Ok(res)
        })
    }
}
