//! Request body size guard.
//!
//! # Responsibilities
//! - Count body bytes across every chunk of a streamed request
//! - Re-read the upload ceiling on each chunk so reloads apply mid-stream
//! - Abort the request with 413 Payload Too Large once the ceiling is crossed
//!
//! # Design Decisions
//! - One `BodySizeGuard` per request, owned by that request's body
//! - Chunked bodies are checked as read; `Content-Length` is not trusted
//! - Every HTTP request is guarded, whatever its headers; frames after an
//!   upgrade never pass through the request body, so they are not counted

use axum::{
    body::{Body, Bytes, HttpBody},
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use hyper::body::{Frame, SizeHint};
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::task::{ready, Context, Poll};

use crate::config::SettingsProvider;
use crate::observability::metrics;
use crate::security::error::GuardError;

const BYTES_PER_MEGABYTE: u64 = 1024 * 1024;

/// Per-request running byte counter.
pub struct BodySizeGuard {
    settings: Arc<dyn SettingsProvider>,
    received: u64,
    verdict: Arc<OnceLock<GuardError>>,
}

impl BodySizeGuard {
    pub fn new(settings: Arc<dyn SettingsProvider>) -> Self {
        Self {
            settings,
            received: 0,
            verdict: Arc::new(OnceLock::new()),
        }
    }

    /// Account for one body chunk.
    ///
    /// The ceiling is looked up on every call. Without a ceiling the chunk
    /// is not counted at all.
    pub fn observe(&mut self, chunk_len: usize) -> Result<(), GuardError> {
        let Some(limit_mb) = self.settings.max_file_size_upload() else {
            return Ok(());
        };

        self.received = self.received.saturating_add(chunk_len as u64);
        if self.received > limit_mb.saturating_mul(BYTES_PER_MEGABYTE) {
            let err = GuardError::PayloadTooLarge {
                limit_mb,
                received_bytes: self.received,
            };
            let _ = self.verdict.set(err.clone());
            return Err(err);
        }
        Ok(())
    }

    /// Bytes counted so far.
    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn is_tripped(&self) -> bool {
        self.verdict.get().is_some()
    }

    /// Shared handle to this guard's outcome, readable after the body is gone.
    pub fn verdict(&self) -> Arc<OnceLock<GuardError>> {
        self.verdict.clone()
    }
}

/// Request body wrapper feeding every data frame through a `BodySizeGuard`.
pub struct GuardedBody {
    inner: Body,
    guard: BodySizeGuard,
}

impl GuardedBody {
    pub fn new(inner: Body, guard: BodySizeGuard) -> Self {
        Self { inner, guard }
    }

    pub fn guard(&self) -> &BodySizeGuard {
        &self.guard
    }
}

impl HttpBody for GuardedBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();

        // Nothing past the offending chunk is read.
        if this.guard.is_tripped() {
            return Poll::Ready(None);
        }

        let frame = match ready!(Pin::new(&mut this.inner).poll_frame(cx)) {
            Some(Ok(frame)) => frame,
            other => return Poll::Ready(other),
        };

        if let Some(data) = frame.data_ref() {
            if let Err(err) = this.guard.observe(data.len()) {
                return Poll::Ready(Some(Err(axum::Error::new(err))));
            }
        }

        Poll::Ready(Some(Ok(frame)))
    }

    fn is_end_stream(&self) -> bool {
        self.guard.is_tripped() || self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

/// Middleware enforcing the upload ceiling on streamed request bodies.
///
/// If the guard trips while the next handler reads the body, the handler's
/// response is discarded and the 413 rejection is returned instead.
pub async fn content_size_limit_middleware(
    State(settings): State<Arc<dyn SettingsProvider>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let guard = BodySizeGuard::new(settings);
    let verdict = guard.verdict();
    let request = request.map(|body| Body::new(GuardedBody::new(body, guard)));

    let response = next.run(request).await;

    match verdict.get() {
        Some(err) => {
            if let GuardError::PayloadTooLarge { limit_mb, received_bytes } = err {
                tracing::warn!(
                    limit_mb = *limit_mb,
                    received_bytes = *received_bytes,
                    "Request body exceeded upload limit"
                );
            }
            metrics::record_rejection(err.reason());
            err.clone().into_response()
        }
        None => response,
    }
}
