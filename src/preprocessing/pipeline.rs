use crate::error::OcrError;
use image::DynamicImage;
use serde::Serialize;
use std::time::Instant;

use super::steps;

/// Timing information for a single preprocessing step
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Result of preprocessing including timing stats
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedImage {
    /// Preprocessed image (not serialized)
    #[serde(skip)]
    pub image: DynamicImage,
    /// Total preprocessing time in milliseconds
    pub total_time_ms: u64,
    /// Individual step timings
    pub steps: Vec<StepTiming>,
}

/// Fixed preprocessing pipeline: grayscale, then contrast boost
#[derive(Debug, Default, Clone, Copy)]
pub struct Pipeline;

impl Pipeline {
    pub fn new() -> Self {
        Self
    }

    /// Process an image for recognition
    pub fn process(&self, image: DynamicImage) -> Result<ProcessedImage, OcrError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(OcrError::PreprocessingError(
                "image has no pixels".to_string(),
            ));
        }

        let start = Instant::now();
        let mut steps_timing = Vec::new();

        let img = self.run_step("grayscale", image, &mut steps_timing, steps::grayscale::apply)?;
        let img = self.run_step("contrast", img, &mut steps_timing, steps::contrast::apply)?;

        let total_time_ms = start.elapsed().as_millis() as u64;
        if let Some(gray) = img.as_luma8() {
            tracing::debug!(
                "Preprocessed {}x{} image in {}ms (luma std-dev {:.1})",
                img.width(),
                img.height(),
                total_time_ms,
                steps::contrast::luma_std_dev(gray)
            );
        }

        Ok(ProcessedImage {
            image: img,
            total_time_ms,
            steps: steps_timing,
        })
    }

    fn run_step<F>(
        &self,
        name: &str,
        img: DynamicImage,
        timings: &mut Vec<StepTiming>,
        step_fn: F,
    ) -> Result<DynamicImage, OcrError>
    where
        F: FnOnce(DynamicImage) -> Result<DynamicImage, OcrError>,
    {
        let step_start = Instant::now();
        let result = step_fn(img)?;
        timings.push(StepTiming {
            name: name.to_string(),
            time_ms: step_start.elapsed().as_millis() as u64,
        });
        Ok(result)
    }
}
