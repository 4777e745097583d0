//! Built-in endpoints served behind the guards.
//!
//! `/health`, `/docs` and `/openapi.json` are the paths the origin gate
//! exempts; the upload endpoint streams its body so the size guard sees
//! every chunk.

use axum::{
    body::Body,
    http::{Method, StatusCode, Uri},
    response::Html,
    Json,
};
use futures_util::StreamExt;
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

/// Result of a completed upload.
#[derive(Debug, Serialize)]
pub struct UploadReceipt {
    pub received_bytes: u64,
    pub chunks: u64,
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn docs() -> Html<&'static str> {
    Html(
        "<!doctype html><html><head><title>ingress-guard</title></head>\
         <body><p>API description: <a href=\"/openapi.json\">/openapi.json</a></p></body></html>",
    )
}

pub async fn openapi() -> Json<Value> {
    Json(json!({
        "openapi": "3.0.3",
        "info": { "title": "ingress-guard", "version": env!("CARGO_PKG_VERSION") },
        "paths": {
            "/health": { "get": { "responses": { "200": { "description": "Service is up" } } } },
            "/api/v1/files/upload": {
                "post": {
                    "responses": {
                        "200": { "description": "Upload accepted" },
                        "401": { "description": "Direct access not allowed" },
                        "413": { "description": "Content size limit exceeded" }
                    }
                }
            }
        }
    }))
}

/// Drain the request body chunk by chunk and report its size.
pub async fn upload(body: Body) -> Result<Json<UploadReceipt>, StatusCode> {
    let mut stream = body.into_data_stream();
    let mut receipt = UploadReceipt {
        received_bytes: 0,
        chunks: 0,
    };

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            tracing::debug!(error = %e, "Upload body read failed");
            StatusCode::BAD_REQUEST
        })?;
        receipt.received_bytes += chunk.len() as u64;
        receipt.chunks += 1;
    }

    Ok(Json(receipt))
}

/// Fallback describing the request it received.
pub async fn echo(method: Method, uri: Uri) -> Json<Value> {
    Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
    }))
}
