//! Tesseract engine implementation
//!
//! Runs the `tesseract` command-line program as an external process. The
//! program must be installed separately and reachable through `PATH` (or
//! configured explicitly with `--tesseract-cmd`).

use crate::config::Config;
use crate::engine::{EngineConfig, OcrEngine, OcrResult};
use crate::error::OcrError;
use image::{DynamicImage, ImageFormat};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

/// Tesseract OCR engine driven through its CLI
pub struct TesseractEngine {
    /// Executable name or path
    command: PathBuf,
    /// Flags passed on every recognition
    config: EngineConfig,
    /// Version reported by `--version`
    version: String,
}

impl TesseractEngine {
    /// Locate the engine and make sure it runs
    pub fn detect(config: &Config) -> Result<Self, OcrError> {
        let command = config.tesseract_cmd.clone();

        let output = Command::new(&command)
            .arg("--version")
            .output()
            .map_err(|e| {
                OcrError::EngineNotFound(format!("failed to run {}: {}", command.display(), e))
            })?;

        if !output.status.success() {
            return Err(OcrError::EngineNotFound(format!(
                "{} --version exited with {}",
                command.display(),
                output.status
            )));
        }

        // Older releases print the banner on stderr
        let version = parse_version(&output.stdout)
            .or_else(|| parse_version(&output.stderr))
            .unwrap_or_else(|| "unknown".to_string());

        let engine_config = config.engine_config();
        tracing::info!(
            "Tesseract engine detected (command: {}, version: {}, flags: {})",
            command.display(),
            version,
            engine_config
        );

        Ok(Self {
            command,
            config: engine_config,
            version,
        })
    }

    /// Write the image to a temporary PNG the engine can read
    fn write_temp_png(image: &DynamicImage) -> Result<tempfile::NamedTempFile, OcrError> {
        let mut temp_file = tempfile::Builder::new()
            .prefix("ocr-desk-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| OcrError::Internal(format!("Failed to create temp file: {}", e)))?;

        image
            .write_to(temp_file.as_file_mut(), ImageFormat::Png)
            .map_err(|e| OcrError::Internal(format!("Failed to encode PNG: {}", e)))?;

        temp_file
            .flush()
            .map_err(|e| OcrError::Internal(format!("Failed to write temp file: {}", e)))?;

        Ok(temp_file)
    }

    fn run(&self, input: &Path) -> Result<String, OcrError> {
        let output = Command::new(&self.command)
            .arg(input)
            .arg("stdout")
            .args(self.config.args())
            .output()
            .map_err(|e| {
                OcrError::RecognitionError(format!(
                    "failed to run {}: {}",
                    self.command.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::RecognitionError(format!(
                "{} exited with {}: {}",
                self.command.display(),
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8(output.stdout)
            .map_err(|e| OcrError::RecognitionError(format!("Invalid UTF-8 output: {}", e)))?;

        Ok(clean_output(&text))
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn recognize(&self, image: &DynamicImage) -> Result<OcrResult, OcrError> {
        let start = Instant::now();
        let temp_file = Self::write_temp_png(image)?;

        tracing::debug!(
            "Running tesseract on {}x{} image ({})",
            image.width(),
            image.height(),
            temp_file.path().display()
        );

        let text = self.run(temp_file.path())?;

        Ok(OcrResult {
            text,
            recognition_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// Extract the version from a `tesseract --version` banner
fn parse_version(raw: &[u8]) -> Option<String> {
    let banner = String::from_utf8_lossy(raw);
    let first_line = banner.lines().next()?;
    let mut parts = first_line.split_whitespace();

    if !parts.next()?.eq_ignore_ascii_case("tesseract") {
        return None;
    }

    parts.next().map(|v| v.trim_start_matches('v').to_string())
}

/// Drop the trailing newlines and page-break the CLI appends
fn clean_output(text: &str) -> String {
    text.trim_end_matches(|c: char| c == '\x0c' || c.is_whitespace())
        .to_string()
}
