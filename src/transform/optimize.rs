//! Image recompression for the image and font tasks.
//!
//! PNG is re-encoded losslessly at maximum compression; JPEG is re-encoded
//! only when a quality is configured. The smaller of input and output wins,
//! so a file never grows. Anything else (SVG, fonts, GIF) passes through.

use std::io::Cursor;

use anyhow::Result;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageFormat};
use rayon::prelude::*;

use super::{Transform, failure};
use crate::asset::Asset;

/// Optimizer settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageOptions {
    /// Re-encode JPEG at this quality (1-100). `None` keeps JPEG untouched.
    pub jpeg_quality: Option<u8>,
}

pub struct ImageTransform {
    options: ImageOptions,
}

impl ImageTransform {
    pub fn new(options: ImageOptions) -> Self {
        Self { options }
    }

    fn format_of(&self, asset: &Asset) -> Option<ImageFormat> {
        match asset.extension().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" if self.options.jpeg_quality.is_some() => Some(ImageFormat::Jpeg),
            _ => None,
        }
    }

    fn encode(&self, image: &DynamicImage, format: ImageFormat) -> image::ImageResult<Vec<u8>> {
        let mut out = Cursor::new(Vec::new());
        match format {
            ImageFormat::Jpeg => {
                let quality = self.options.jpeg_quality.unwrap_or(100).clamp(1, 100);
                image.write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality))?;
            }
            _ => {
                let encoder = PngEncoder::new_with_quality(
                    &mut out,
                    CompressionType::Best,
                    FilterType::Adaptive,
                );
                image.write_with_encoder(encoder)?;
            }
        }
        Ok(out.into_inner())
    }

    fn optimize(&self, asset: Asset) -> Result<Asset> {
        let Some(format) = self.format_of(&asset) else {
            return Ok(asset);
        };

        let image = image::load_from_memory_with_format(&asset.contents, format)
            .map_err(|e| failure(self.name(), &asset, e))?;
        let encoded = self
            .encode(&image, format)
            .map_err(|e| failure(self.name(), &asset, e))?;

        if encoded.len() < asset.contents.len() {
            Ok(Asset::new(asset.path, encoded))
        } else {
            Ok(asset)
        }
    }
}

impl Transform for ImageTransform {
    fn name(&self) -> &'static str {
        "image"
    }

    fn apply(&self, assets: Vec<Asset>) -> Result<Vec<Asset>> {
        assets
            .into_par_iter()
            .map(|asset| self.optimize(asset))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn png_fast(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, _| Rgb([(x % 2 * 255) as u8, 0, 0]));
        let mut out = Cursor::new(Vec::new());
        let encoder =
            PngEncoder::new_with_quality(&mut out, CompressionType::Fast, FilterType::NoFilter);
        DynamicImage::ImageRgb8(img).write_with_encoder(encoder).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_png_never_grows_and_stays_decodable() {
        let input = png_fast(64, 64);
        let out = ImageTransform::new(ImageOptions::default())
            .apply(vec![Asset::new("assets/images/a.png", input.clone())])
            .unwrap();

        assert!(out[0].contents.len() <= input.len());
        let decoded = image::load_from_memory(&out[0].contents).unwrap();
        assert_eq!(decoded.width(), 64);
        assert_eq!(
            decoded.to_rgb8().get_pixel(1, 0),
            &Rgb([255, 0, 0])
        );
    }

    #[test]
    fn test_non_images_pass_through() {
        let assets = vec![
            Asset::new("assets/fonts/a.woff2", vec![1, 2, 3]),
            Asset::new("assets/images/logo.svg", "<svg/>"),
            Asset::new("assets/images/photo.jpg", vec![0xff, 0xd8]),
        ];
        let out = ImageTransform::new(ImageOptions::default())
            .apply(assets.clone())
            .unwrap();
        assert_eq!(out, assets);
    }

    #[test]
    fn test_jpeg_recompressed_when_quality_set() {
        let img = RgbImage::from_fn(48, 48, |x, y| Rgb([(x * 5) as u8, (y * 5) as u8, 128]));
        let mut input = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_with_encoder(JpegEncoder::new_with_quality(&mut input, 100))
            .unwrap();
        let input = input.into_inner();

        let out = ImageTransform::new(ImageOptions {
            jpeg_quality: Some(50),
        })
        .apply(vec![Asset::new("assets/images/a.jpeg", input.clone())])
        .unwrap();

        assert!(out[0].contents.len() < input.len());
        assert_eq!(image::load_from_memory(&out[0].contents).unwrap().width(), 48);
    }

    #[test]
    fn test_corrupt_png_is_an_error() {
        let err = ImageTransform::new(ImageOptions::default())
            .apply(vec![Asset::new("broken.png", vec![0, 1, 2])])
            .unwrap_err();
        assert!(err.to_string().starts_with("image failed on broken.png"));
    }
}
