//! Image loading utilities for texture data
//!
//! Decodes image files into raw pixel data ready for GPU upload. The native
//! channel count is preserved (1 = grayscale, 3 = RGB, 4 = RGBA) because the
//! GL internal-format selection depends on it.

use std::path::Path;

use crate::assets::AssetError;

/// Decoded image data ready for GPU upload
#[derive(Debug, Clone)]
pub struct ImageData {
    /// Raw pixel data, tightly packed rows
    pub data: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Number of color channels (1, 3, or 4)
    pub channels: u8,
}

impl ImageData {
    /// Load an image from a file path
    ///
    /// Grayscale, RGB, and RGBA images keep their channel count; anything
    /// else is converted to RGBA.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        let path_ref = path.as_ref();

        log::debug!("Loading image from: {:?}", path_ref);

        let img = image::open(path_ref)
            .map_err(|e| AssetError::LoadFailed(format!("{:?}: {}", path_ref, e)))?;

        let (data, width, height, channels) = match img {
            image::DynamicImage::ImageLuma8(buf) => {
                let (w, h) = buf.dimensions();
                (buf.into_raw(), w, h, 1)
            }
            image::DynamicImage::ImageRgb8(buf) => {
                let (w, h) = buf.dimensions();
                (buf.into_raw(), w, h, 3)
            }
            image::DynamicImage::ImageRgba8(buf) => {
                let (w, h) = buf.dimensions();
                (buf.into_raw(), w, h, 4)
            }
            other => {
                let buf = other.to_rgba8();
                let (w, h) = buf.dimensions();
                (buf.into_raw(), w, h, 4)
            }
        };

        log::info!(
            "Loaded image {}x{} ({} channels) from {:?}",
            width,
            height,
            channels,
            path_ref
        );

        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    /// Create a solid color image (placeholder for failed loads)
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixel_count = (width * height) as usize;
        let mut data = Vec::with_capacity(pixel_count * 4);

        for _ in 0..pixel_count {
            data.extend_from_slice(&color);
        }

        Self {
            data,
            width,
            height,
            channels: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_color_image() {
        let img = ImageData::solid_color(4, 4, [255, 0, 0, 255]);
        assert_eq!(img.width, 4);
        assert_eq!(img.height, 4);
        assert_eq!(img.channels, 4);
        assert_eq!(img.data.len(), 4 * 4 * 4); // 4x4 pixels, 4 bytes each

        // Check first pixel is red
        assert_eq!(&img.data[0..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = ImageData::from_file("definitely/not/a/real/file.png");
        assert!(matches!(result, Err(AssetError::LoadFailed(_))));
    }
}
