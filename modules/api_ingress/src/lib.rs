//! HTTP host: wraps module routers with the shared middleware stack,
//! `/health`, the 404 fallback and the OpenAPI document, then serves them.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    http::header,
    middleware::from_fn,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

mod config;
pub mod error;
mod openapi;
pub mod request_id;
mod web;

pub use config::ApiIngressConfig;
pub use error::{not_found, AppError, ErrorBody};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const BODY_LIMIT_BYTES: usize = 16 * 1024 * 1024;

pub struct ApiIngress {
    config: ApiIngressConfig,
    request_timeout: Duration,
    openapi: utoipa::openapi::OpenApi,
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig) -> Self {
        Self {
            config,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            openapi: openapi::base_document(),
        }
    }

    /// Per-request timeout; zero keeps the default.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.request_timeout = timeout;
        }
        self
    }

    pub fn config(&self) -> &ApiIngressConfig {
        &self.config
    }

    /// Merge a module's paths and schemas into the served document.
    pub fn register_openapi(&mut self, doc: utoipa::openapi::OpenApi) {
        let before = self.openapi.paths.paths.len();
        self.openapi.merge(doc);
        tracing::debug!(
            added = self.openapi.paths.paths.len() - before,
            "registered OpenAPI paths"
        );
    }

    pub fn openapi(&self) -> &utoipa::openapi::OpenApi {
        &self.openapi
    }

    /// Resolve the listen address: `bind_addr` wins over the server section.
    pub fn bind_addr(&self, host: &str, port: u16) -> Result<SocketAddr> {
        let raw = match self.config.bind_addr.as_deref().map(str::trim) {
            Some(addr) if !addr.is_empty() => addr.to_string(),
            _ => format!("{host}:{port}"),
        };
        raw.parse::<SocketAddr>()
            .with_context(|| format!("Invalid bind address '{raw}'"))
    }

    /// Wrap module routes with host endpoints, the fallback and middleware.
    pub fn build_router(&self, routes: Router) -> Result<Router> {
        let mut router = Router::new()
            .route("/health", get(web::health_check).fallback(not_found))
            .merge(routes);

        if self.config.enable_docs {
            // Serialized once, served as static JSON.
            let doc = Arc::new(serde_json::to_value(&self.openapi)?);
            router = router
                .route(
                    "/openapi.json",
                    get(move || {
                        let doc = doc.clone();
                        async move {
                            ([(header::CACHE_CONTROL, "no-store")], Json((*doc).clone()))
                                .into_response()
                        }
                    })
                    .fallback(not_found),
                )
                .route("/docs", get(web::serve_docs).fallback(not_found));
        }

        let mut router = router
            .fallback(not_found)
            .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES));
        if self.config.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }

        // Outermost first: request id is set before the trace span reads it.
        let x_request_id = request_id::header();
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(
                x_request_id.clone(),
                request_id::MakeReqId,
            ))
            .layer(PropagateRequestIdLayer::new(x_request_id))
            .layer(request_id::create_trace_layer())
            .layer(from_fn(request_id::push_req_id_to_extensions))
            .layer(from_fn(error::json_error_body))
            .layer(TimeoutLayer::new(self.request_timeout));

        Ok(router.layer(middleware))
    }

    /// Bind and serve until `cancel` fires, then drain in-flight requests.
    pub async fn serve(router: Router, addr: SocketAddr, cancel: CancellationToken) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        tracing::info!("HTTP server bound on {}", addr);

        let shutdown = async move {
            cancel.cancelled().await;
            tracing::info!("HTTP server shutting down gracefully");
        };

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .context("HTTP server failed")
    }
}
