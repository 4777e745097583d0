//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Guards and handlers produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID attached to rejection logs
//! - Metrics are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
