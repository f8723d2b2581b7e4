//! Audio and video conversion via ffmpeg.
//!
//! Both categories share one transcode path: stage the payload in a scratch
//! directory, run `ffmpeg -i input.<in> output.<out>` and read the result
//! back. ffmpeg picks codecs from the output extension, which is exactly
//! the declared-format contract the dispatcher enforces.
//!
//! # System requirement
//!
//! ffmpeg must be installed. Custom locations can be supplied via the
//! `ffmpeg_path` config field or the `MORPH_FFMPEG_PATH` environment
//! variable.

use crate::convert::scratch::ScratchDir;
use crate::core::config::ServiceConfig;
use crate::core::dispatch::CategoryConverter;
use crate::core::registry::Category;
use crate::error::{MorphError, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::process::Command;

fn ffmpeg_candidates(configured: Option<&Path>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    let mut push_candidate = |path: PathBuf| {
        if seen.insert(path.clone()) {
            candidates.push(path);
        }
    };

    if let Some(configured) = configured {
        push_candidate(configured.to_path_buf());
    }

    for var in ["MORPH_FFMPEG_PATH", "FFMPEG_PATH"] {
        if let Some(value) = env::var_os(var).filter(|v| !v.is_empty()) {
            push_candidate(PathBuf::from(value));
        }
    }

    if let Some(path_env) = env::var_os("PATH") {
        for dir in env::split_paths(&path_env) {
            push_candidate(dir.join("ffmpeg"));
            push_candidate(dir.join("ffmpeg.exe"));
        }
    }

    candidates
}

fn locate_ffmpeg(configured: Option<&Path>) -> Result<PathBuf> {
    for candidate in ffmpeg_candidates(configured) {
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    Err(MorphError::MissingTool(
        "ffmpeg is required for audio and video conversion. Install it, or \
         point the ffmpeg_path config field or the MORPH_FFMPEG_PATH \
         environment variable at the executable."
            .to_string(),
    ))
}

async fn transcode(
    configured: Option<&Path>,
    label: &str,
    payload: &[u8],
    input_format: &str,
    output_format: &str,
) -> Result<Vec<u8>> {
    let ffmpeg = locate_ffmpeg(configured)?;

    let scratch = ScratchDir::new(label).await?;
    let input_path = scratch.path().join(format!("input.{}", input_format));
    let output_path = scratch.path().join(format!("output.{}", output_format));
    fs::write(&input_path, payload).await?;

    let output = Command::new(&ffmpeg)
        .arg("-hide_banner")
        .arg("-loglevel")
        .arg("error")
        .arg("-y")
        .arg("-i")
        .arg(&input_path)
        .arg(&output_path)
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        // dispatcher timeout cancellation must reap the process
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
            MorphError::conversion_failed_with_source(
                format!("failed to execute ffmpeg at '{}'", ffmpeg.display()),
                e,
            )
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MorphError::conversion_failed(format!(
            "ffmpeg exited with {}: {}",
            output.status.code().unwrap_or(-1),
            stderr.trim()
        )));
    }

    let converted = fs::read(&output_path).await.map_err(|e| {
        MorphError::conversion_failed_with_source("ffmpeg reported success but produced no output file", e)
    })?;

    if converted.is_empty() {
        return Err(MorphError::conversion_failed("ffmpeg conversion produced an empty file"));
    }

    Ok(converted)
}

/// ffmpeg-backed audio converter.
pub struct AudioConverter {
    ffmpeg_path: Option<PathBuf>,
}

impl AudioConverter {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
        }
    }
}

#[async_trait]
impl CategoryConverter for AudioConverter {
    fn category(&self) -> Category {
        Category::Audio
    }

    async fn run(&self, payload: &[u8], input_format: &str, output_format: &str) -> Result<Vec<u8>> {
        transcode(self.ffmpeg_path.as_deref(), "audio", payload, input_format, output_format).await
    }
}

/// ffmpeg-backed video converter.
pub struct VideoConverter {
    ffmpeg_path: Option<PathBuf>,
}

impl VideoConverter {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
        }
    }
}

#[async_trait]
impl CategoryConverter for VideoConverter {
    fn category(&self) -> Category {
        Category::Video
    }

    async fn run(&self, payload: &[u8], input_format: &str, output_format: &str) -> Result<Vec<u8>> {
        transcode(self.ffmpeg_path.as_deref(), "video", payload, input_format, output_format).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_path_is_first_candidate() {
        let configured = PathBuf::from("/opt/ffmpeg/bin/ffmpeg");
        let candidates = ffmpeg_candidates(Some(&configured));
        assert_eq!(candidates[0], configured);
    }

    #[test]
    fn test_categories() {
        let config = ServiceConfig::default();
        assert_eq!(AudioConverter::new(&config).category(), Category::Audio);
        assert_eq!(VideoConverter::new(&config).category(), Category::Video);
    }

    #[tokio::test]
    async fn test_corrupt_audio_with_installed_ffmpeg() {
        if locate_ffmpeg(None).is_err() {
            return;
        }

        let config = ServiceConfig::default();
        let converter = AudioConverter::new(&config);
        let err = converter.run(b"not audio", "mp3", "wav").await.unwrap_err();
        assert!(matches!(err, MorphError::ConversionFailed { .. }));
    }
}
