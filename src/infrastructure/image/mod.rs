//! Image to pixel-grid conversion
//!
//! Fetches an image by URL and flattens it to a 32x32 RGB grid for
//! in-game pixel art rendering.

use std::time::Duration;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use serde::Serialize;

use crate::application::errors::ApiError;

pub const TARGET_SIZE: u32 = 32;
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// One output pixel. Field names match the in-game consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pixel {
    #[serde(rename = "R")]
    pub r: u8,
    #[serde(rename = "G")]
    pub g: u8,
    #[serde(rename = "B")]
    pub b: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct Conversion {
    pub pixels: Vec<Pixel>,
    pub original_size: (u32, u32),
    pub final_size: (u32, u32),
    pub resize_method: &'static str,
}

pub struct ImageConverter {
    client: reqwest::Client,
}

impl ImageConverter {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Fetch and convert an image
    pub async fn convert_url(&self, url: &str, crop: bool) -> Result<Conversion, ApiError> {
        tracing::info!("Processing image from URL: {}, crop_mode: {}", url, crop);

        let response = self
            .client
            .get(url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::Timeout
                } else {
                    ApiError::Upstream(format!("Failed to fetch image: {}", e))
                }
            })?;

        if !response.status().is_success() {
            return Err(ApiError::Upstream(format!(
                "Failed to fetch image: HTTP {}",
                response.status().as_u16()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Upstream(format!("Failed to read image: {}", e)))?;
        let img = image::load_from_memory(&bytes)
            .map_err(|e| ApiError::BadRequest(format!("Invalid image: {}", e)))?;

        Ok(convert(&img, crop))
    }
}

impl Default for ImageConverter {
    fn default() -> Self {
        Self::new()
    }
}

/// Flatten an image to the 32x32 grid
pub fn convert(img: &DynamicImage, crop: bool) -> Conversion {
    let original_size = img.dimensions();
    let (resized, resize_method) = if crop {
        (resize_with_crop(img, TARGET_SIZE), "crop")
    } else {
        (
            img.resize_exact(TARGET_SIZE, TARGET_SIZE, FilterType::Lanczos3),
            "simple_resize",
        )
    };

    let rgb = resized.to_rgb8();
    let pixels = rgb
        .pixels()
        .map(|p| Pixel {
            r: p.0[0],
            g: p.0[1],
            b: p.0[2],
        })
        .collect();

    Conversion {
        pixels,
        original_size,
        final_size: (TARGET_SIZE, TARGET_SIZE),
        resize_method,
    }
}

/// Scale so the shorter side reaches the target, then center-crop
fn resize_with_crop(img: &DynamicImage, target: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    let scale = (target as f64 / width as f64).max(target as f64 / height as f64);
    let new_width = ((width as f64 * scale) as u32).max(target);
    let new_height = ((height as f64 * scale) as u32).max(target);

    let resized = img.resize_exact(new_width, new_height, FilterType::Lanczos3);
    let left = (new_width - target) / 2;
    let top = (new_height - target) / 2;
    resized.crop_imm(left, top, target, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn solid_image(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_pixel(width, height, Rgb(color)))
    }

    #[test]
    fn crop_mode_yields_exactly_1024_pixels() {
        let img = solid_image(100, 50, [200, 10, 30]);
        let conversion = convert(&img, true);

        assert_eq!(conversion.pixels.len(), 1024);
        assert_eq!(conversion.original_size, (100, 50));
        assert_eq!(conversion.final_size, (32, 32));
        assert_eq!(conversion.resize_method, "crop");
        assert!(conversion
            .pixels
            .iter()
            .all(|p| *p == Pixel { r: 200, g: 10, b: 30 }));
    }

    #[test]
    fn simple_resize_distorts_instead_of_cropping() {
        let img = solid_image(64, 16, [0, 0, 0]);
        let conversion = convert(&img, false);
        assert_eq!(conversion.pixels.len(), 1024);
        assert_eq!(conversion.resize_method, "simple_resize");
    }

    #[test]
    fn tiny_images_are_upscaled() {
        let img = solid_image(2, 3, [255, 255, 255]);
        let conversion = convert(&img, true);
        assert_eq!(conversion.pixels.len(), 1024);
    }

    #[test]
    fn pixel_serializes_with_rgb_keys() {
        let json = serde_json::to_string(&Pixel { r: 1, g: 2, b: 3 }).unwrap();
        assert_eq!(json, r#"{"R":1,"G":2,"B":3}"#);
    }
}
