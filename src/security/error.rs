//! Rejections produced by the request guards.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Detail returned to clients whose origin is not allow-listed.
pub const DIRECT_ACCESS_DETAIL: &str = "Direct access not allowed";

const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// Terminal outcome of a guard check. Scoped to a single request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    /// The streamed body grew past the configured upload ceiling.
    #[error(
        "Content size limit exceeded. Maximum allowed is {limit_mb}MB and got {received_mb}MB.",
        received_mb = format_megabytes(.received_bytes)
    )]
    PayloadTooLarge { limit_mb: u64, received_bytes: u64 },

    /// The request's origin matched no allow-list entry.
    #[error("{}", DIRECT_ACCESS_DETAIL)]
    OriginRejected { origin: String },
}

impl GuardError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GuardError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GuardError::OriginRejected { .. } => StatusCode::UNAUTHORIZED,
        }
    }

    /// Label used for the rejection counter.
    pub fn reason(&self) -> &'static str {
        match self {
            GuardError::PayloadTooLarge { .. } => "payload_too_large",
            GuardError::OriginRejected { .. } => "origin_rejected",
        }
    }
}

impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

/// Bytes as megabytes rounded to three decimals (ties to even), always with
/// a fractional part (`1.172`, `2.0`).
fn format_megabytes(bytes: &u64) -> String {
    let megabytes = (*bytes as f64 / BYTES_PER_MEGABYTE * 1000.0).round_ties_even() / 1000.0;
    format!("{:?}", megabytes)
}
