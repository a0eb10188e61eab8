//! Image preprocessing for OCR
//!
//! Converts the decoded image to luminance and boosts its contrast before it
//! is handed to the engine.

pub mod pipeline;
pub mod steps;

pub use pipeline::{Pipeline, ProcessedImage, StepTiming};
