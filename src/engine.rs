use crate::error::OcrError;
use image::DynamicImage;
use std::fmt;

/// Recognition algorithm family selected on the engine (`--oem`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
pub enum EngineMode {
    /// Legacy pattern-matching recognizer
    Legacy,
    /// Neural-network (LSTM) recognizer
    Lstm,
    /// Both recognizers combined
    Combined,
    /// Engine default; LSTM-based on any current build
    Default,
}

impl EngineMode {
    pub fn value(&self) -> u8 {
        match self {
            Self::Legacy => 0,
            Self::Lstm => 1,
            Self::Combined => 2,
            Self::Default => 3,
        }
    }
}

/// How the engine interprets page layout (`--psm`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
pub enum PageSegmentation {
    /// Fully automatic page segmentation
    Auto,
    /// Assume a single column of text of variable sizes
    SingleColumn,
    /// Assume a single uniform block of text
    UniformBlock,
    /// Treat the image as a single text line
    SingleLine,
}

impl PageSegmentation {
    pub fn value(&self) -> u8 {
        match self {
            Self::Auto => 3,
            Self::SingleColumn => 4,
            Self::UniformBlock => 6,
            Self::SingleLine => 7,
        }
    }
}

/// Flags passed to the engine on every recognition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub language: String,
    pub engine_mode: EngineMode,
    pub page_segmentation: PageSegmentation,
}

impl EngineConfig {
    /// LSTM recognizer over a single uniform block of text
    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_string(),
            engine_mode: EngineMode::Default,
            page_segmentation: PageSegmentation::UniformBlock,
        }
    }

    /// Command-line flags for the engine
    pub fn args(&self) -> Vec<String> {
        vec![
            "-l".to_string(),
            self.language.clone(),
            "--oem".to_string(),
            self.engine_mode.value().to_string(),
            "--psm".to_string(),
            self.page_segmentation.value().to_string(),
        ]
    }
}

impl fmt::Display for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.args().join(" "))
    }
}

/// OCR processing result
#[derive(Debug, Clone, PartialEq)]
pub struct OcrResult {
    pub text: String,
    pub recognition_time_ms: u64,
}

impl OcrResult {
    /// True when the engine produced something worth copying
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Trait that all OCR engines must implement
pub trait OcrEngine: Send + Sync {
    /// Returns the engine identifier (e.g., "tesseract")
    fn name(&self) -> &'static str;

    /// Version reported by the engine at startup
    fn version(&self) -> &str;

    /// Recognize the text in an already preprocessed image
    fn recognize(&self, image: &DynamicImage) -> Result<OcrResult, OcrError>;
}
