//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the built-in handlers
//! - Wire up middleware (request ID, tracing, timeout, metrics, guards)
//! - Apply live config updates to the settings service
//! - Serve until the shutdown signal fires

use axum::{
    body::Body,
    http::Request,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{GuardConfig, SettingsProvider, SettingsService, UploadSettings};
use crate::http::handlers;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, X_REQUEST_ID};
use crate::observability::metrics;
use crate::security::{content_size_limit_middleware, origin_validation_middleware, OriginGate};

/// HTTP server wrapping the built-in handlers with both guards.
pub struct HttpServer {
    router: Router,
    config: GuardConfig,
    settings: Arc<SettingsService>,
}

impl HttpServer {
    /// Create a server whose origin gate reads `ALLOWED_ORIGINS`.
    pub fn new(config: GuardConfig) -> Self {
        Self::with_origin_gate(config, OriginGate::from_env())
    }

    /// Create a server with an explicit origin gate.
    pub fn with_origin_gate(config: GuardConfig, origin_gate: OriginGate) -> Self {
        let settings = Arc::new(SettingsService::new(config.uploads));
        let router = Self::build_router(&config, settings.clone(), Arc::new(origin_gate));
        Self {
            router,
            config,
            settings,
        }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Outermost first: request id, trace, request id echo, timeout,
    /// metrics, origin gate, body size guard.
    #[allow(deprecated)]
    fn build_router(
        config: &GuardConfig,
        settings: Arc<SettingsService>,
        origin_gate: Arc<OriginGate>,
    ) -> Router {
        let settings: Arc<dyn SettingsProvider> = settings;

        Router::new()
            .route("/health", get(handlers::health))
            .route("/docs", get(handlers::docs))
            .route("/openapi.json", get(handlers::openapi))
            .route("/api/v1/files/upload", post(handlers::upload))
            .fallback(handlers::echo)
            .layer(from_fn_with_state(settings, content_size_limit_middleware))
            .layer(from_fn_with_state(origin_gate, origin_validation_middleware))
            .layer(from_fn(metrics::track_requests))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id
                )
            }))
            .layer(set_request_id_layer())
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Settings received on `upload_updates` replace the live upload ceiling;
    /// the server stops when `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut upload_updates: mpsc::UnboundedReceiver<UploadSettings>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            max_file_size_upload_mb = ?self.config.uploads.max_file_size_upload,
            "HTTP server starting"
        );

        let settings = self.settings.clone();
        let reloader = tokio::spawn(async move {
            while let Some(uploads) = upload_updates.recv().await {
                settings.store(uploads);
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Live settings consulted by the body size guard.
    pub fn settings(&self) -> Arc<SettingsService> {
        self.settings.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, StatusCode};
    use tower::ServiceExt;

    fn server(limit_mb: Option<u64>, allowed: &str) -> HttpServer {
        let mut config = GuardConfig::default();
        config.uploads = UploadSettings {
            max_file_size_upload: limit_mb,
        };
        HttpServer::with_origin_gate(config, OriginGate::from_allowed_origins(allowed))
    }

    fn upload(bytes: usize, origin: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri("/api/v1/files/upload");
        if let Some(origin) = origin {
            builder = builder.header(header::ORIGIN, origin);
        }
        builder.body(Body::from(vec![0u8; bytes])).unwrap()
    }

    async fn json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_upload_within_limit() {
        let response = server(Some(1), "")
            .router()
            .oneshot(upload(1024, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(X_REQUEST_ID));
        assert_eq!(json(response).await["received_bytes"], 1024);
    }

    #[tokio::test]
    async fn test_upload_over_limit() {
        let response = server(Some(1), "")
            .router()
            .oneshot(upload(2 * 1024 * 1024, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            json(response).await["detail"],
            "Content size limit exceeded. Maximum allowed is 1MB and got 2.0MB."
        );
    }

    #[tokio::test]
    async fn test_origin_checked_before_body() {
        let response = server(Some(1), "https://app.example.com")
            .router()
            .oneshot(upload(2 * 1024 * 1024, Some("https://evil.com")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_settings_change_applies_to_next_request() {
        let server = server(Some(1), "");
        server.settings().store(UploadSettings::unlimited());

        let response = server
            .router()
            .oneshot(upload(2 * 1024 * 1024, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_fallback_echo_behind_gate() {
        let server = server(None, "https://app.example.com");

        let allowed = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/flows")
                    .header(header::REFERER, "https://app.example.com/embed")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(allowed.status(), StatusCode::OK);
        assert_eq!(json(allowed).await["path"], "/api/v1/flows");

        let health = server
            .router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(health.status(), StatusCode::OK);
    }
}
