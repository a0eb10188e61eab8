//! OCR engine implementations
//!
//! This module contains implementations of the OcrEngine trait. The only
//! backend is the external Tesseract program.

pub mod tesseract;

use crate::config::Config;
use crate::engine::OcrEngine;
use crate::error::OcrError;
use std::sync::Arc;

/// Detect the configured engine; failure here is fatal for the application
pub fn detect(config: &Config) -> Result<Arc<dyn OcrEngine>, OcrError> {
    tracing::info!("Detecting tesseract engine...");
    let engine = tesseract::TesseractEngine::detect(config)?;
    Ok(Arc::new(engine))
}
