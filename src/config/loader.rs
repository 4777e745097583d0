//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use crate::config::schema::{GuardConfig, UploadSettings};
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `uploads.max_file_size_upload`.
pub const MAX_FILE_SIZE_UPLOAD_ENV: &str = "GUARD_MAX_FILE_SIZE_UPLOAD";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, value: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, value } => {
                write!(f, "Invalid value `{}` for {}", value, var)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GuardConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

/// Parse, apply environment overrides and validate a TOML document.
pub fn parse_config(content: &str) -> Result<GuardConfig, ConfigError> {
    let mut config: GuardConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
    apply_env_overrides(&mut config)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Built-in defaults with environment overrides applied.
pub fn default_config() -> Result<GuardConfig, ConfigError> {
    let mut config = GuardConfig::default();
    apply_env_overrides(&mut config)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn apply_env_overrides(config: &mut GuardConfig) -> Result<(), ConfigError> {
    if let Ok(raw) = std::env::var(MAX_FILE_SIZE_UPLOAD_ENV) {
        config.uploads = parse_upload_ceiling(&raw).ok_or(ConfigError::Env {
            var: MAX_FILE_SIZE_UPLOAD_ENV,
            value: raw,
        })?;
    }
    Ok(())
}

/// Parse an upload ceiling in megabytes. Blank, `none` and `unlimited`
/// disable the limit.
pub fn parse_upload_ceiling(raw: &str) -> Option<UploadSettings> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("none") || raw.eq_ignore_ascii_case("unlimited") {
        return Some(UploadSettings::unlimited());
    }
    raw.parse().ok().map(UploadSettings::limited)
}
