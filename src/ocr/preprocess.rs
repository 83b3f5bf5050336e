use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::{grayscale_dilate, Mask};

use crate::config::PreprocessConfig;
use crate::error::ReadError;

/// Decodes raw bytes (PNG, JPEG, ...) into an image.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, ReadError> {
    Ok(image::load_from_memory(bytes)?)
}

/// Normalizes a screenshot into the binary form Tesseract reads best.
///
/// 1. Resize to the canonical resolution. Aspect ratio is not kept: all
///    culvert screenshots share one layout, so a fixed size normalizes glyph
///    height across capture resolutions.
/// 2. Grayscale, then Otsu threshold with inverted polarity (text becomes white).
/// 3. Gaussian smoothing, then one pass of dilation to thicken thin strokes.
/// 4. Invert back to dark text on a light background.
pub fn preprocess(img: &DynamicImage, config: &PreprocessConfig) -> GrayImage {
    let resized = img.resize_exact(config.width, config.height, FilterType::Triangle);
    let gray = resized.to_luma8();

    let level = otsu_level(&gray);
    let binary = threshold(&gray, level, ThresholdType::BinaryInverted);

    let smoothed = if config.blur_sigma > 0.0 {
        gaussian_blur_f32(&binary, config.blur_sigma)
    } else {
        binary
    };

    let mut output = if config.dilate_kernel > 1 {
        grayscale_dilate(&smoothed, &square_mask(config.dilate_kernel))
    } else {
        smoothed
    };
    imageops::invert(&mut output);
    output
}

/// Square `size`×`size` structuring element anchored at `size / 2`.
///
/// For a 2×2 kernel each pixel takes the max over itself and its left,
/// upper and upper-left neighbors.
pub fn square_mask(size: u32) -> Mask {
    let ones = GrayImage::from_pixel(size, size, Luma([255]));
    let anchor = (size / 2) as u8;
    Mask::from_image(&ones, anchor, anchor)
}
