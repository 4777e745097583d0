//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → origin.rs (allow-listed Origin/Referer, else 401)
//!     → body_limit.rs (streamed body under upload ceiling, else 413)
//!     → Pass to handlers
//! ```
//!
//! # Design Decisions
//! - Each guard is an independent axum middleware; either can be used alone
//! - Rejections are terminal responses, never retried
//! - Guard state is per request or read-only; no locks

pub mod body_limit;
pub mod error;
pub mod origin;

pub use body_limit::{content_size_limit_middleware, BodySizeGuard, GuardedBody};
pub use error::GuardError;
pub use origin::{origin_validation_middleware, OriginGate};
