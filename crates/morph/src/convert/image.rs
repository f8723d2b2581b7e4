//! Image conversion via the `image` crate.
//!
//! Decodes with the *declared* input format rather than sniffing the bytes;
//! a payload that does not parse as its declared format is a conversion
//! failure, not an excuse to guess.

use crate::core::dispatch::CategoryConverter;
use crate::core::registry::Category;
use crate::error::{MorphError, Result};
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// In-process image converter.
pub struct ImageConverter;

/// Map a registry token to the `image` crate's format enum.
fn image_format(token: &str) -> Result<ImageFormat> {
    match token {
        "png" => Ok(ImageFormat::Png),
        "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
        "webp" => Ok(ImageFormat::WebP),
        "bmp" => Ok(ImageFormat::Bmp),
        "gif" => Ok(ImageFormat::Gif),
        "tiff" => Ok(ImageFormat::Tiff),
        other => Err(MorphError::UnknownFormat(other.to_string())),
    }
}

#[async_trait]
impl CategoryConverter for ImageConverter {
    fn category(&self) -> Category {
        Category::Image
    }

    async fn run(&self, payload: &[u8], input_format: &str, output_format: &str) -> Result<Vec<u8>> {
        let source_format = image_format(input_format)?;
        let target_format = image_format(output_format)?;

        let decoded = image::load_from_memory_with_format(payload, source_format).map_err(|e| {
            MorphError::conversion_failed_with_source(format!("failed to decode {} payload", input_format), e)
        })?;

        // JPEG has no alpha channel; flatten before encoding
        let decoded = match target_format {
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(decoded.to_rgb8()),
            _ => decoded,
        };

        let mut output = Cursor::new(Vec::new());
        decoded.write_to(&mut output, target_format).map_err(|e| {
            MorphError::conversion_failed_with_source(format!("failed to encode {} output", output_format), e)
        })?;

        Ok(output.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn sample_png() -> Vec<u8> {
        let img = RgbaImage::from_pixel(2, 2, image::Rgba([200, 40, 40, 255]));
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut bytes, ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    #[tokio::test]
    async fn test_png_to_jpeg() {
        let converter = ImageConverter;
        let output = converter.run(&sample_png(), "png", "jpg").await.unwrap();

        assert!(!output.is_empty());
        // JPEG magic bytes
        assert_eq!(&output[..2], &[0xFF, 0xD8]);
    }

    #[tokio::test]
    async fn test_png_to_bmp_roundtrips_dimensions() {
        let converter = ImageConverter;
        let output = converter.run(&sample_png(), "png", "bmp").await.unwrap();

        let decoded = image::load_from_memory_with_format(&output, ImageFormat::Bmp).unwrap();
        assert_eq!(decoded.width(), 2);
        assert_eq!(decoded.height(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_payload_is_conversion_failure() {
        let converter = ImageConverter;
        let err = converter.run(&[0xDE, 0xAD, 0xBE, 0xEF], "png", "jpg").await.unwrap_err();

        assert!(matches!(err, MorphError::ConversionFailed { .. }));
        assert!(err.to_string().contains("decode"));
    }

    #[tokio::test]
    async fn test_alpha_flattened_for_jpeg() {
        let img = RgbaImage::from_pixel(1, 1, image::Rgba([10, 20, 30, 128]));
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut bytes, ImageFormat::Png)
            .unwrap();

        let converter = ImageConverter;
        let output = converter.run(&bytes.into_inner(), "png", "jpeg").await.unwrap();
        assert!(image::load_from_memory_with_format(&output, ImageFormat::Jpeg).is_ok());
    }

    #[test]
    fn test_image_format_tokens() {
        assert_eq!(image_format("jpg").unwrap(), ImageFormat::Jpeg);
        assert_eq!(image_format("jpeg").unwrap(), ImageFormat::Jpeg);
        assert!(image_format("svg").is_err());
    }
}
