use image::{imageops::FilterType, DynamicImage, GenericImageView, RgbaImage};

/// Longest edge of the preview shown next to the results
pub const PREVIEW_MAX_EDGE: u32 = 600;

/// Downscaled RGBA copy of an opened image, ready for display
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewImage {
    pub pixels: RgbaImage,
}

impl PreviewImage {
    /// Fit the image inside a PREVIEW_MAX_EDGE square, keeping aspect ratio.
    /// Images that already fit are copied at their original size.
    pub fn from_image(image: &DynamicImage) -> Self {
        let (width, height) = image.dimensions();

        if width <= PREVIEW_MAX_EDGE && height <= PREVIEW_MAX_EDGE {
            return Self {
                pixels: image.to_rgba8(),
            };
        }

        let scale = PREVIEW_MAX_EDGE as f32 / width.max(height) as f32;
        let new_width = ((width as f32 * scale).round() as u32).max(1);
        let new_height = ((height as f32 * scale).round() as u32).max(1);

        Self {
            pixels: image
                .resize_exact(new_width, new_height, FilterType::Triangle)
                .to_rgba8(),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}
