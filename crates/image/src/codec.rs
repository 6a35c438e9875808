//! Decoding and encoding through the image crate.

use crate::alpha::{flatten_alpha, has_alpha_channel, WHITE};
use crate::{ImageError, ImageFormat, Result};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageEncoder, ImageOutputFormat};
use std::io::Cursor;

/// Options for encoding an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Output format
    pub format: ImageFormat,
    /// JPEG quality (1-100); other formats are written losslessly
    pub quality: u8,
}

impl EncodeOptions {
    /// Encode to `format` at `quality`
    pub fn new(format: ImageFormat, quality: u8) -> Self {
        Self {
            format,
            quality: quality.clamp(1, 100),
        }
    }
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            format: ImageFormat::Jpeg,
            quality: 85,
        }
    }
}

/// Raster codec capability.
pub trait Codec {
    /// Decode file data into a raster
    fn decode(&self, data: &[u8]) -> Result<DynamicImage>;

    /// Encode a raster into file data
    fn encode(&self, img: &DynamicImage, options: &EncodeOptions) -> Result<Vec<u8>>;
}

/// [`Codec`] backed by the image crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCodec;

impl Codec for ImageCodec {
    fn decode(&self, data: &[u8]) -> Result<DynamicImage> {
        if data.is_empty() {
            return Err(ImageError::InvalidData("Empty file".into()));
        }
        Ok(image::load_from_memory(data)?)
    }

    fn encode(&self, img: &DynamicImage, options: &EncodeOptions) -> Result<Vec<u8>> {
        encode_image(img, options.format, options.quality)
    }
}

/// Encode a DynamicImage to bytes.
fn encode_image(img: &DynamicImage, format: ImageFormat, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());

    match format {
        ImageFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgb8(flatten_alpha(img, WHITE));
            rgb.write_to(&mut buffer, ImageOutputFormat::Jpeg(quality.clamp(1, 100)))?;
        }
        ImageFormat::Png => {
            let encoder = PngEncoder::new_with_quality(&mut buffer, CompressionType::Best, FilterType::Adaptive);
            if has_alpha_channel(img) {
                let rgba = img.to_rgba8();
                encoder.write_image(rgba.as_raw(), rgba.width(), rgba.height(), image::ColorType::Rgba8)?;
            } else {
                let rgb = img.to_rgb8();
                encoder.write_image(rgb.as_raw(), rgb.width(), rgb.height(), image::ColorType::Rgb8)?;
            }
        }
        ImageFormat::WebP => {
            DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut buffer, ImageOutputFormat::WebP)?;
        }
        ImageFormat::Gif => {
            DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut buffer, ImageOutputFormat::Gif)?;
        }
        other => return Err(ImageError::UnsupportedOutput(other)),
    }

    Ok(buffer.into_inner())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::detect_format;
    use image::{Rgba, RgbaImage};

    /// Small RGBA test image with a transparent corner.
    pub(crate) fn sample_image() -> DynamicImage {
        let mut img = RgbaImage::from_pixel(8, 6, Rgba([200, 40, 40, 255]));
        img.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        DynamicImage::ImageRgba8(img)
    }

    /// `sample_image` encoded as PNG.
    pub(crate) fn sample_png() -> Vec<u8> {
        ImageCodec.encode(&sample_image(), &EncodeOptions::new(ImageFormat::Png, 100)).unwrap()
    }

    #[test]
    fn test_encode_options_default() {
        let opts = EncodeOptions::default();
        assert_eq!(opts.format, ImageFormat::Jpeg);
        assert_eq!(opts.quality, 85);
        assert_eq!(EncodeOptions::new(ImageFormat::Jpeg, 0).quality, 1);
    }

    #[test]
    fn test_encode_each_writable_format() {
        let img = sample_image();
        for format in [ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::WebP, ImageFormat::Gif] {
            let data = ImageCodec.encode(&img, &EncodeOptions::new(format, 80)).unwrap();
            assert_eq!(detect_format(&data).unwrap(), format);

            let decoded = ImageCodec.decode(&data).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (8, 6));
        }
    }

    #[test]
    fn test_png_keeps_alpha() {
        let decoded = ImageCodec.decode(&sample_png()).unwrap();
        assert!(has_alpha_channel(&decoded));
        assert_eq!(decoded.to_rgba8().get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn test_lower_quality_is_smaller() {
        let mut img = RgbaImage::new(64, 64);
        for (x, y, px) in img.enumerate_pixels_mut() {
            *px = Rgba([(x * 4) as u8, (y * 4) as u8, ((x ^ y) * 4) as u8, 255]);
        }
        let img = DynamicImage::ImageRgba8(img);

        let high = ImageCodec.encode(&img, &EncodeOptions::new(ImageFormat::Jpeg, 95)).unwrap();
        let low = ImageCodec.encode(&img, &EncodeOptions::new(ImageFormat::Jpeg, 10)).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn test_unsupported_output() {
        let err = ImageCodec
            .encode(&sample_image(), &EncodeOptions::new(ImageFormat::Tiff, 80))
            .unwrap_err();
        assert!(matches!(err, ImageError::UnsupportedOutput(ImageFormat::Tiff)));
    }

    #[test]
    fn test_decode_garbage() {
        assert!(ImageCodec.decode(b"definitely not an image").is_err());
        assert!(matches!(ImageCodec.decode(&[]), Err(ImageError::InvalidData(_))));
    }
}
