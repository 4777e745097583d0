//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + GUARD_* environment
//!     → loader.rs (parse, env overrides)
//!     → validation.rs (semantic checks)
//!     → GuardConfig (validated)
//!     → uploads section published through settings.rs
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server swaps the new UploadSettings into SettingsService
//!     → body size guard sees it on the next chunk
//! ```
//!
//! # Design Decisions
//! - Only upload settings are live; listener and timeouts need a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod settings;
pub mod validation;
pub mod watcher;

pub use schema::GuardConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::UploadSettings;
pub use settings::{SettingsProvider, SettingsService};
