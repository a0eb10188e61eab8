use thiserror::Error;

/// Instructions shown when the OCR engine cannot be found at startup
pub const SETUP_INSTRUCTIONS: &str = "Tesseract not found!\n\n\
Please install Tesseract OCR and ensure it is in your system's PATH.\n\n\
On macOS with Homebrew: brew install tesseract";

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("OCR engine not available: {0}")]
    EngineNotFound(String),

    #[error("Failed to load image: {0}")]
    ImageLoadError(String),

    #[error("Preprocessing failed: {0}")]
    PreprocessingError(String),

    #[error("Recognition failed: {0}")]
    RecognitionError(String),

    #[error("Clipboard unavailable: {0}")]
    ClipboardError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OcrError {
    /// Text shown in the error dialog for a failed open/recognize action
    pub fn user_message(&self) -> String {
        match self {
            OcrError::ClipboardError(_) => format!("Failed to copy text:\n{}", self),
            _ => format!("Failed to process image:\n{}", self),
        }
    }
}
