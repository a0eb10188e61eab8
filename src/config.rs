use crate::engine::EngineConfig;
use crate::Args;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Command used to launch the OCR engine
    pub tesseract_cmd: PathBuf,
    /// Language passed to the engine
    pub language: String,
}

impl Config {
    /// Engine flags derived from this configuration
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(&self.language)
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            tesseract_cmd: args.tesseract_cmd,
            language: args.language,
        }
    }
}
