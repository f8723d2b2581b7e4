//! Service configuration loading.
//!
//! Policy values the dispatcher must not hard-code (payload ceiling,
//! identity-conversion behavior, conversion timeout, tool locations) live
//! here. Configuration is loaded from `morph.toml` via [`ServiceConfig::discover`]
//! or created programmatically; every field has a serde default so a partial
//! file is fine.

use crate::error::{MorphError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_max_payload_bytes() -> usize {
    100 * 1024 * 1024
}

fn default_timeout_seconds() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

/// Service-wide conversion policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Maximum accepted payload size in bytes. Larger payloads are rejected
    /// before any converter is invoked.
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,

    /// Whether identity conversions (input format == output format) are
    /// returned as-is without invoking the category converter.
    #[serde(default = "default_true")]
    pub identity_passthrough: bool,

    /// Per-request conversion timeout in seconds. A timed-out conversion is
    /// reported as a conversion failure.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Explicit path to the LibreOffice `soffice` binary. When unset, the
    /// binary is located via `MORPH_LIBREOFFICE_PATH` and `PATH`.
    #[serde(default)]
    pub soffice_path: Option<PathBuf>,

    /// Explicit path to the `ffmpeg` binary. When unset, the binary is
    /// located via `MORPH_FFMPEG_PATH` and `PATH`.
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: default_max_payload_bytes(),
            identity_passthrough: default_true(),
            timeout_seconds: default_timeout_seconds(),
            soffice_path: None,
            ffmpeg_path: None,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `MorphError::Validation` if the file cannot be read or is
    /// invalid TOML.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            MorphError::validation(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        toml::from_str(&content)
            .map_err(|e| MorphError::validation(format!("Invalid TOML in {}: {}", path.as_ref().display(), e)))
    }

    /// Discover a `morph.toml` in the current directory or any parent.
    ///
    /// Returns `None` if no config file is found.
    pub fn discover() -> Result<Option<Self>> {
        let mut current = std::env::current_dir().map_err(MorphError::Io)?;

        loop {
            let morph_toml = current.join("morph.toml");
            if morph_toml.exists() {
                return Ok(Some(Self::from_toml_file(morph_toml)?));
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.max_payload_bytes, 100 * 1024 * 1024);
        assert!(config.identity_passthrough);
        assert_eq!(config.timeout_seconds, 300);
        assert!(config.soffice_path.is_none());
        assert!(config.ffmpeg_path.is_none());
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("morph.toml");
        fs::write(
            &config_path,
            r#"
max_payload_bytes = 1048576
identity_passthrough = false
timeout_seconds = 30
ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"
"#,
        )
        .unwrap();

        let config = ServiceConfig::from_toml_file(&config_path).unwrap();
        assert_eq!(config.max_payload_bytes, 1024 * 1024);
        assert!(!config.identity_passthrough);
        assert_eq!(config.timeout_seconds, 30);
        assert_eq!(config.ffmpeg_path.as_deref(), Some(Path::new("/opt/ffmpeg/bin/ffmpeg")));
    }

    #[test]
    fn test_from_toml_file_partial() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("morph.toml");
        fs::write(&config_path, "timeout_seconds = 10\n").unwrap();

        let config = ServiceConfig::from_toml_file(&config_path).unwrap();
        assert_eq!(config.timeout_seconds, 10);
        assert_eq!(config.max_payload_bytes, 100 * 1024 * 1024);
        assert!(config.identity_passthrough);
    }

    #[test]
    fn test_from_toml_file_missing() {
        let err = ServiceConfig::from_toml_file("/nonexistent/morph.toml").unwrap_err();
        assert!(matches!(err, MorphError::Validation { .. }));
    }

    #[test]
    fn test_from_toml_file_invalid() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("morph.toml");
        fs::write(&config_path, "max_payload_bytes = \"not a number\"\n").unwrap();

        let err = ServiceConfig::from_toml_file(&config_path).unwrap_err();
        assert!(matches!(err, MorphError::Validation { .. }));
    }
}
