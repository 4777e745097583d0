//! Request guards for axum services.
//!
//! Two independent middlewares:
//! - [`security::body_limit`]: caps streamed request bodies at a live,
//!   reloadable upload ceiling (413 Payload Too Large)
//! - [`security::origin`]: rejects requests whose `Origin`/`Referer` is not
//!   allow-listed (401)

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::GuardConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
