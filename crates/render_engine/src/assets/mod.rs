//! Asset loading
//!
//! CPU-side image decoding; GPU upload lives in [`crate::render::texture`].

pub mod image_loader;

use thiserror::Error;

pub use image_loader::ImageData;

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// The underlying decoder rejected the file
    #[error("failed to load image: {0}")]
    LoadFailed(String),
}
