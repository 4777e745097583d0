//! Origin validation middleware.
//! Blocks direct (non-embedded) access by checking `Origin`/`Referer`
//! against an allow-list of origin prefixes.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::http::X_REQUEST_ID;
use crate::observability::metrics;
use crate::security::error::GuardError;

/// Environment variable holding the comma-separated allow-list.
pub const ALLOWED_ORIGINS_ENV: &str = "ALLOWED_ORIGINS";

/// Path prefixes never subject to origin validation.
pub const BYPASS_PATHS: [&str; 3] = ["/health", "/docs", "/openapi.json"];

/// Immutable allow-list shared by all requests.
#[derive(Debug, Clone)]
pub struct OriginGate {
    allowed_origins: Vec<String>,
}

impl OriginGate {
    /// Build the gate from `ALLOWED_ORIGINS`. Unset means disabled.
    pub fn from_env() -> Self {
        let raw = std::env::var(ALLOWED_ORIGINS_ENV).unwrap_or_default();
        Self::from_allowed_origins(&raw)
    }

    /// Build the gate from a comma-separated list of origin prefixes.
    pub fn from_allowed_origins(raw: &str) -> Self {
        let allowed_origins: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect();

        if allowed_origins.is_empty() {
            tracing::info!("Origin validation disabled (no ALLOWED_ORIGINS set)");
        } else {
            tracing::info!(allowed_origins = ?allowed_origins, "Origin validation enabled");
        }

        Self { allowed_origins }
    }

    /// An empty allow-list disables the gate.
    pub fn is_enabled(&self) -> bool {
        !self.allowed_origins.is_empty()
    }

    pub fn allowed_origins(&self) -> &[String] {
        &self.allowed_origins
    }

    pub fn is_bypass_path(&self, path: &str) -> bool {
        BYPASS_PATHS.iter().any(|prefix| path.starts_with(prefix))
    }

    /// Plain string prefix match; an empty origin is never allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if origin.is_empty() {
            return false;
        }
        self.allowed_origins
            .iter()
            .any(|allowed| origin.starts_with(allowed.as_str()))
    }
}

/// `Origin` if present and non-empty, otherwise `Referer`, otherwise "".
pub fn extract_origin(headers: &HeaderMap) -> String {
    let value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
    };

    value(header::ORIGIN)
        .or_else(|| value(header::REFERER))
        .unwrap_or_default()
        .to_string()
}

pub async fn origin_validation_middleware(
    State(gate): State<Arc<OriginGate>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    // 1. Disabled mode: no allow-list configured.
    if !gate.is_enabled() {
        return next.run(request).await;
    }

    // 2. Health checks and API docs stay reachable.
    if gate.is_bypass_path(request.uri().path()) {
        return next.run(request).await;
    }

    // 3. Validate origin
    let origin = extract_origin(request.headers());
    if !gate.is_origin_allowed(&origin) {
        let request_id = request
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown");
        tracing::warn!(
            request_id = %request_id,
            path = %request.uri().path(),
            "Blocked direct access from: {}",
            if origin.is_empty() { "unknown origin" } else { origin.as_str() }
        );

        let err = GuardError::OriginRejected { origin };
        metrics::record_rejection(err.reason());
        return err.into_response();
    }

    next.run(request).await
}
