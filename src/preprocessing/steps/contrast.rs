use crate::error::OcrError;
use image::{DynamicImage, GrayImage};
use imageproc::stats::histogram;

/// Gain applied to each pixel's distance from the image's mean gray level
pub const CONTRAST_FACTOR: f32 = 2.0;

/// Boost contrast by a fixed factor
///
/// Every pixel moves away from the mean luminance of the image:
/// `out = mean + CONTRAST_FACTOR * (in - mean)`, clamped to 0-255.
/// A uniform image has nothing to stretch and comes back unchanged.
pub fn apply(image: DynamicImage) -> Result<DynamicImage, OcrError> {
    let gray = image.into_luma8();
    let pivot = mean_luma(&gray);
    Ok(DynamicImage::ImageLuma8(enhance(&gray, pivot, CONTRAST_FACTOR)))
}

fn enhance(gray: &GrayImage, pivot: u8, factor: f32) -> GrayImage {
    let pivot = pivot as f32;
    let mut lut = [0u8; 256];
    for (value, slot) in lut.iter_mut().enumerate() {
        let stretched = pivot + factor * (value as f32 - pivot);
        *slot = stretched.round().clamp(0.0, 255.0) as u8;
    }

    let mut out = gray.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = lut[pixel.0[0] as usize];
    }
    out
}

/// Mean gray level, rounded to the nearest integer
pub fn mean_luma(img: &GrayImage) -> u8 {
    let hist = histogram(img);
    let counts = &hist.channels[0];
    let total: u64 = counts.iter().map(|&c| c as u64).sum();
    if total == 0 {
        return 0;
    }

    let sum: u64 = counts
        .iter()
        .enumerate()
        .map(|(value, &count)| value as u64 * count as u64)
        .sum();

    (sum as f64 / total as f64).round() as u8
}

/// Population standard deviation of the gray levels
pub fn luma_std_dev(img: &GrayImage) -> f64 {
    let hist = histogram(img);
    let counts = &hist.channels[0];
    let total: f64 = counts.iter().map(|&c| c as f64).sum();
    if total == 0.0 {
        return 0.0;
    }

    let mean = counts
        .iter()
        .enumerate()
        .map(|(value, &count)| value as f64 * count as f64)
        .sum::<f64>()
        / total;

    let variance = counts
        .iter()
        .enumerate()
        .map(|(value, &count)| {
            let delta = value as f64 - mean;
            delta * delta * count as f64
        })
        .sum::<f64>()
        / total;

    variance.sqrt()
}
