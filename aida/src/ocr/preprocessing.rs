use crate::config::OcrConfig;
use crate::error::{AidaError, Result};
use image::{DynamicImage, GenericImageView, GrayImage, ImageFormat, ImageReader};

/// Normalise an image for Tesseract.
///
/// Decodes the bytes, rejects images below the minimum dimension, downscales
/// anything above the maximum (aspect ratio kept), converts to grayscale,
/// stretches the histogram and re-encodes as PNG.
pub fn preprocess_image(bytes: &[u8], config: &OcrConfig) -> Result<Vec<u8>> {
    let img = ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| AidaError::Processing(format!("Failed to read image: {e}")))?
        .decode()
        .map_err(|e| AidaError::Processing(format!("Failed to decode image: {e}")))?;

    let (width, height) = img.dimensions();
    if width < config.min_image_dimension || height < config.min_image_dimension {
        return Err(AidaError::Processing(format!(
            "Image too small: {}x{}, minimum {}x{}",
            width, height, config.min_image_dimension, config.min_image_dimension
        )));
    }

    let img = resize_if_needed(img, config.max_image_dimension);
    let gray = stretch_contrast(img.to_luma8());

    let mut output = Vec::new();
    DynamicImage::ImageLuma8(gray)
        .write_to(&mut std::io::Cursor::new(&mut output), ImageFormat::Png)
        .map_err(|e| AidaError::Processing(format!("Failed to encode image: {e}")))?;

    Ok(output)
}

/// Uses Lanczos3 for downscaling.
fn resize_if_needed(img: DynamicImage, max_dim: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    if width <= max_dim && height <= max_dim {
        return img;
    }

    let ratio = max_dim as f32 / width.max(height) as f32;
    let new_width = ((width as f32 * ratio) as u32).max(1);
    let new_height = ((height as f32 * ratio) as u32).max(1);

    img.resize(new_width, new_height, image::imageops::FilterType::Lanczos3)
}

/// Linear histogram stretch to the full 0..=255 range.
fn stretch_contrast(mut gray: GrayImage) -> GrayImage {
    let (min, max) = gray
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));

    if max <= min {
        return gray;
    }

    let range = (max - min) as f32;
    for pixel in gray.pixels_mut() {
        pixel[0] = (((pixel[0] - min) as f32 / range) * 255.0).round() as u8;
    }
    gray
}
