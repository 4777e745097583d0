//! Upload settings hot reload.
//!
//! Watches the TOML config file and publishes the `uploads` section whenever
//! a change yields a valid config with a different ceiling. Files that fail to
//! parse or validate are logged and leave the live settings untouched.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::UploadSettings;

/// Re-reads the config file and reports upload settings that changed.
struct UploadReloader {
    path: PathBuf,
    current: UploadSettings,
}

impl UploadReloader {
    fn reload(&mut self) -> Option<UploadSettings> {
        let uploads = match load_config(&self.path) {
            Ok(config) => config.uploads,
            Err(e) => {
                tracing::error!(
                    path = ?self.path,
                    error = %e,
                    "Ignoring invalid config, upload limit unchanged"
                );
                return None;
            }
        };

        if uploads == self.current {
            tracing::debug!(path = ?self.path, "Config reloaded, upload limit unchanged");
            return None;
        }

        self.current = uploads;
        Some(uploads)
    }
}

/// Publishes reloaded `UploadSettings` to the server.
pub struct UploadSettingsWatcher {
    reloader: UploadReloader,
    update_tx: mpsc::UnboundedSender<UploadSettings>,
}

impl UploadSettingsWatcher {
    /// `current` is the ceiling already in effect; only differing ones are sent.
    pub fn new(
        path: &Path,
        current: UploadSettings,
    ) -> (Self, mpsc::UnboundedReceiver<UploadSettings>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let reloader = UploadReloader {
            path: path.to_path_buf(),
            current,
        };
        (Self { reloader, update_tx }, update_rx)
    }

    /// Start watching. The returned handle must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.reloader.path.clone();
        let mut reloader = self.reloader;
        let tx = self.update_tx;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    if let Some(uploads) = reloader.reload() {
                        tracing::info!(
                            max_file_size_upload_mb = ?uploads.max_file_size_upload,
                            "Upload settings reloaded"
                        );
                        let _ = tx.send(uploads);
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    struct TempConfig(PathBuf);

    impl TempConfig {
        fn new(content: &str) -> Self {
            let path =
                std::env::temp_dir().join(format!("ingress-guard-{}.toml", uuid::Uuid::new_v4()));
            fs::write(&path, content).unwrap();
            Self(path)
        }

        fn write(&self, content: &str) {
            fs::write(&self.0, content).unwrap();
        }
    }

    impl Drop for TempConfig {
        fn drop(&mut self) {
            let _ = fs::remove_file(&self.0);
        }
    }

    fn reloader(file: &TempConfig, current: UploadSettings) -> UploadReloader {
        UploadReloader {
            path: file.0.clone(),
            current,
        }
    }

    #[test]
    fn test_reload_reports_changed_ceiling() {
        let file = TempConfig::new("[uploads]\nmax_file_size_upload = 1\n");
        let mut reloader = reloader(&file, UploadSettings::limited(1));
        assert_eq!(reloader.reload(), None);

        file.write("[uploads]\nmax_file_size_upload = 5\n");
        assert_eq!(reloader.reload(), Some(UploadSettings::limited(5)));
        assert_eq!(reloader.reload(), None);

        file.write("[uploads]\n");
        assert_eq!(reloader.reload(), Some(UploadSettings::unlimited()));
    }

    #[test]
    fn test_reload_ignores_invalid_file() {
        let file = TempConfig::new("[uploads]\nmax_file_size_upload = 1\n");
        let mut reloader = reloader(&file, UploadSettings::limited(1));

        file.write("[uploads]\nmax_file_size_upload = \"lots\"\n");
        assert_eq!(reloader.reload(), None);

        file.write("[timeouts]\nrequest_secs = 0\n");
        assert_eq!(reloader.reload(), None);
        assert_eq!(reloader.current, UploadSettings::limited(1));
    }

    #[tokio::test]
    async fn test_file_write_publishes_update() {
        let file = TempConfig::new("[uploads]\nmax_file_size_upload = 1\n");
        let (watcher, mut updates) =
            UploadSettingsWatcher::new(&file.0, UploadSettings::limited(1));
        let _handle = watcher.run().unwrap();

        file.write("[uploads]\nmax_file_size_upload = 5\n");

        // A write may surface as several events; wait for the final content.
        let update = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                match updates.recv().await {
                    Some(uploads) if uploads == UploadSettings::limited(5) => return uploads,
                    Some(_) => continue,
                    None => panic!("watcher channel closed"),
                }
            }
        })
        .await
        .expect("no update for a valid write");
        assert_eq!(update, UploadSettings::limited(5));
    }

    #[tokio::test]
    async fn test_invalid_write_publishes_nothing() {
        // An empty file is the default config, so a truncated read is a no-op.
        let file = TempConfig::new("");
        let (watcher, mut updates) = UploadSettingsWatcher::new(&file.0, UploadSettings::default());
        let _handle = watcher.run().unwrap();

        file.write("[uploads]\nmax_file_size_upload = \"lots\"\n");

        let received = tokio::time::timeout(Duration::from_secs(1), updates.recv()).await;
        assert!(received.is_err(), "unexpected update: {:?}", received);
    }
}
