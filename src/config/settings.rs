//! Runtime settings service.
//!
//! The body size guard asks for the upload ceiling on every chunk it reads,
//! so the current value lives behind an `ArcSwap`: reads are lock-free and a
//! reload swaps the whole snapshot atomically.

use arc_swap::ArcSwap;
use std::sync::Arc;

use crate::config::schema::UploadSettings;

/// Source of the upload ceiling consulted by the body size guard.
pub trait SettingsProvider: Send + Sync {
    /// Maximum upload size in megabytes, `None` for no limit.
    fn max_file_size_upload(&self) -> Option<u64>;
}

impl SettingsProvider for UploadSettings {
    fn max_file_size_upload(&self) -> Option<u64> {
        self.max_file_size_upload
    }
}

/// Hot-swappable settings shared by all requests.
#[derive(Debug)]
pub struct SettingsService {
    current: ArcSwap<UploadSettings>,
}

impl SettingsService {
    pub fn new(settings: UploadSettings) -> Self {
        Self {
            current: ArcSwap::from_pointee(settings),
        }
    }

    /// Snapshot of the current settings.
    pub fn load(&self) -> Arc<UploadSettings> {
        self.current.load_full()
    }

    /// Replace the current settings. In-flight requests see the new
    /// ceiling on their next chunk.
    pub fn store(&self, settings: UploadSettings) {
        let previous = self.current.swap(Arc::new(settings));
        if *previous != settings {
            tracing::info!(
                previous_mb = ?previous.max_file_size_upload,
                current_mb = ?settings.max_file_size_upload,
                "Upload size limit updated"
            );
        }
    }
}

impl Default for SettingsService {
    fn default() -> Self {
        Self::new(UploadSettings::default())
    }
}

impl SettingsProvider for SettingsService {
    fn max_file_size_upload(&self) -> Option<u64> {
        self.current.load().max_file_size_upload
    }
}
