//! Document conversion via LibreOffice headless mode.
//!
//! Handles the sparse document pair set (pdf→docx, docx→pdf, pdf→txt,
//! docx→txt) by staging the payload through a scratch directory and running
//! `soffice --headless --convert-to`. PDF inputs need the Writer PDF import
//! filter so the result is editable text rather than a page image.
//!
//! # System requirement
//!
//! LibreOffice must be installed and `soffice` reachable. Custom locations
//! can be supplied via the `soffice_path` config field or the
//! `MORPH_LIBREOFFICE_PATH` environment variable.

use crate::convert::scratch::ScratchDir;
use crate::core::config::ServiceConfig;
use crate::core::dispatch::CategoryConverter;
use crate::core::registry::Category;
use crate::error::{MorphError, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::env;
use std::path::PathBuf;
use tokio::fs;
use tokio::process::Command;

/// LibreOffice-backed document converter.
pub struct DocumentConverter {
    soffice_path: Option<PathBuf>,
}

impl DocumentConverter {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            soffice_path: config.soffice_path.clone(),
        }
    }

    fn candidates(&self) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        let mut push_candidate = |path: PathBuf| {
            if seen.insert(path.clone()) {
                candidates.push(path);
            }
        };

        if let Some(configured) = &self.soffice_path {
            push_candidate(configured.clone());
        }

        for var in ["MORPH_LIBREOFFICE_PATH", "SOFFICE_PATH", "LIBREOFFICE_PATH"] {
            if let Some(value) = env::var_os(var).filter(|v| !v.is_empty()) {
                push_candidate(PathBuf::from(value));
            }
        }

        if cfg!(target_os = "macos") {
            push_candidate(PathBuf::from("/Applications/LibreOffice.app/Contents/MacOS/soffice"));
        }

        if cfg!(target_os = "windows") {
            push_candidate(PathBuf::from("C:\\Program Files\\LibreOffice\\program\\soffice.exe"));
        }

        if let Some(path_env) = env::var_os("PATH") {
            for dir in env::split_paths(&path_env) {
                push_candidate(dir.join("soffice"));
                push_candidate(dir.join("libreoffice"));
                push_candidate(dir.join("soffice.exe"));
            }
        }

        candidates
    }

    fn locate_soffice(&self) -> Result<PathBuf> {
        for candidate in self.candidates() {
            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        Err(MorphError::MissingTool(
            "LibreOffice (soffice) is required for document conversion. \
             Install it, or point the soffice_path config field or the \
             MORPH_LIBREOFFICE_PATH environment variable at the executable."
                .to_string(),
        ))
    }
}

#[async_trait]
impl CategoryConverter for DocumentConverter {
    fn category(&self) -> Category {
        Category::Document
    }

    async fn run(&self, payload: &[u8], input_format: &str, output_format: &str) -> Result<Vec<u8>> {
        let soffice = self.locate_soffice()?;

        let input_dir = ScratchDir::new("doc_in").await?;
        let output_dir = ScratchDir::new("doc_out").await?;

        let input_path = input_dir.path().join(format!("input.{}", input_format));
        fs::write(&input_path, payload).await?;

        let mut command = Command::new(&soffice);
        command.arg("--headless");
        if input_format == "pdf" {
            command.arg("--infilter=writer_pdf_import");
        }
        command
            .arg("--convert-to")
            .arg(output_format)
            .arg("--outdir")
            .arg(output_dir.path())
            .arg(&input_path)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            // dispatcher timeout cancellation must reap the process
            .kill_on_drop(true);

        let output = command.output().await.map_err(|e| {
            MorphError::conversion_failed_with_source(
                format!("failed to execute LibreOffice at '{}'", soffice.display()),
                e,
            )
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let detail = if !stderr.trim().is_empty() { stderr } else { stdout };
            return Err(MorphError::conversion_failed(format!(
                "LibreOffice exited with {}: {}",
                output.status.code().unwrap_or(-1),
                detail.trim()
            )));
        }

        let converted_path = output_dir.path().join(format!("input.{}", output_format));
        let converted = fs::read(&converted_path).await.map_err(|e| {
            MorphError::conversion_failed_with_source(
                "LibreOffice reported success but produced no output file",
                e,
            )
        })?;

        if converted.is_empty() {
            return Err(MorphError::conversion_failed(
                "LibreOffice conversion produced an empty file",
            ));
        }

        Ok(converted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converter() -> DocumentConverter {
        DocumentConverter::new(&ServiceConfig::default())
    }

    #[test]
    fn test_configured_path_is_first_candidate() {
        let config = ServiceConfig {
            soffice_path: Some(PathBuf::from("/opt/libreoffice/soffice")),
            ..ServiceConfig::default()
        };
        let converter = DocumentConverter::new(&config);
        assert_eq!(converter.candidates()[0], PathBuf::from("/opt/libreoffice/soffice"));
    }

    #[test]
    fn test_missing_soffice_is_missing_tool() {
        let config = ServiceConfig {
            soffice_path: Some(PathBuf::from("/nonexistent/soffice")),
            ..ServiceConfig::default()
        };
        let converter = DocumentConverter::new(&config);
        // Only meaningful on machines without LibreOffice on PATH; with it
        // installed, locate succeeds and that is fine too.
        match converter.locate_soffice() {
            Ok(path) => assert!(path.is_file()),
            Err(err) => assert!(matches!(err, MorphError::MissingTool(_))),
        }
    }

    #[tokio::test]
    async fn test_docx_to_pdf_with_installed_libreoffice() {
        let converter = converter();
        if converter.locate_soffice().is_err() {
            return;
        }

        // Minimal but valid docx would need a zip container; feed garbage
        // and only assert the failure is classified, not a panic.
        let result = converter.run(b"not a real docx", "docx", "pdf").await;
        assert!(result.is_err());
    }

    #[test]
    fn test_category() {
        assert_eq!(converter().category(), Category::Document);
    }
}
