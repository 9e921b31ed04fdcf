//! Texture factory and file-backed texture loading
//!
//! Color render targets come in two formats selected by an HDR flag; loaded
//! 2D textures and cubemaps pick their GL format from the decoded channel
//! count. A file that fails to load produces a black placeholder and a
//! warning instead of aborting, so the demo keeps running without assets.

use std::path::Path;

use glow::HasContext;
use thiserror::Error;

use crate::assets::{AssetError, ImageData};

/// Texture allocation errors
#[derive(Error, Debug)]
pub enum TextureError {
    /// The driver refused to allocate a texture object
    #[error("failed to allocate GL texture: {0}")]
    Allocate(String),
}

/// Pixel format of a color render target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorFormat {
    /// 8-bit unsigned RGB, for display-ready output
    Rgb8,
    /// 16-bit float RGB, for high-dynamic-range intermediates
    RgbF16,
}

impl ColorFormat {
    /// Select the format for a render target from the HDR flag
    pub fn from_hdr(hdr: bool) -> Self {
        if hdr {
            Self::RgbF16
        } else {
            Self::Rgb8
        }
    }

    /// Whether values outside [0, 1] survive a write to this format
    pub fn is_hdr(self) -> bool {
        matches!(self, Self::RgbF16)
    }

    /// GL sized internal format
    pub fn internal_format(self) -> i32 {
        match self {
            Self::Rgb8 => glow::RGB8 as i32,
            Self::RgbF16 => glow::RGB16F as i32,
        }
    }

    /// GL pixel transfer type matching the internal format
    pub fn pixel_type(self) -> u32 {
        match self {
            Self::Rgb8 => glow::UNSIGNED_BYTE,
            Self::RgbF16 => glow::FLOAT,
        }
    }
}

/// A 2D color texture usable as a render target
///
/// Pipeline textures live for the whole process; there is no teardown path
/// because the pass topology is fixed and bounded.
#[derive(Debug, Clone, Copy)]
pub struct Texture {
    raw: glow::NativeTexture,
    width: i32,
    height: i32,
    format: ColorFormat,
}

impl Texture {
    /// Allocate an empty color render target
    ///
    /// No initial pixel data is uploaded; the first pass targeting the
    /// texture fills it. Filtering is linear in both directions.
    pub fn color_target(
        gl: &glow::Context,
        width: i32,
        height: i32,
        hdr: bool,
    ) -> Result<Self, TextureError> {
        let format = ColorFormat::from_hdr(hdr);

        let raw = unsafe {
            let raw = gl.create_texture().map_err(TextureError::Allocate)?;
            gl.bind_texture(glow::TEXTURE_2D, Some(raw));
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                format.internal_format(),
                width,
                height,
                0,
                glow::RGB,
                format.pixel_type(),
                None,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::LINEAR as i32,
            );
            gl.bind_texture(glow::TEXTURE_2D, None);
            raw
        };

        Ok(Self {
            raw,
            width,
            height,
            format,
        })
    }

    /// Wrap an externally created texture handle
    pub fn from_raw_parts(
        raw: glow::NativeTexture,
        width: i32,
        height: i32,
        format: ColorFormat,
    ) -> Self {
        Self {
            raw,
            width,
            height,
            format,
        }
    }

    /// The underlying GL handle
    pub fn raw(&self) -> glow::NativeTexture {
        self.raw
    }

    /// Width in pixels
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Pixel format chosen at allocation
    pub fn format(&self) -> ColorFormat {
        self.format
    }
}

/// Cubemap face file names, in GL face order starting at `+X`
pub const CUBEMAP_FACES: [&str; 6] = ["right", "left", "top", "bottom", "front", "back"];

/// GL (internal format, transfer format) for a decoded channel count
///
/// Three- and four-channel images are treated as sRGB content.
fn image_gl_formats(channels: u8) -> Option<(i32, u32)> {
    match channels {
        1 => Some((glow::R8 as i32, glow::RED)),
        3 => Some((glow::SRGB8 as i32, glow::RGB)),
        4 => Some((glow::SRGB8_ALPHA8 as i32, glow::RGBA)),
        _ => None,
    }
}

/// Decoded image or a 1x1 black placeholder when decoding failed
fn image_or_placeholder(result: Result<ImageData, AssetError>, what: &str) -> ImageData {
    match result {
        Ok(image) => {
            if image_gl_formats(image.channels).is_some() {
                image
            } else {
                log::warn!(
                    "{} has unsupported channel count {}, using placeholder",
                    what,
                    image.channels
                );
                ImageData::solid_color(1, 1, [0, 0, 0, 255])
            }
        }
        Err(e) => {
            log::warn!("{}: {}, using placeholder", what, e);
            ImageData::solid_color(1, 1, [0, 0, 0, 255])
        }
    }
}

unsafe fn upload_image(gl: &glow::Context, target: u32, image: &ImageData) {
    // image rows are tightly packed; the default 4-byte unpack alignment
    // would skew odd-width RGB uploads
    gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);

    let (internal_format, format) =
        image_gl_formats(image.channels).expect("placeholder filtering guarantees a known format");
    gl.tex_image_2d(
        target,
        0,
        internal_format,
        image.width as i32,
        image.height as i32,
        0,
        format,
        glow::UNSIGNED_BYTE,
        Some(&image.data),
    );
}

/// Load a 2D texture from an image file
///
/// Format is selected by channel count (1 = red-only, 3 = sRGB,
/// 4 = sRGB-alpha). A missing or malformed file logs a warning and yields a
/// black placeholder texture. `repeat` selects repeat wrapping over
/// clamp-to-edge.
pub fn load_texture_2d(
    gl: &glow::Context,
    path: impl AsRef<Path>,
    repeat: bool,
) -> Result<glow::NativeTexture, TextureError> {
    let path = path.as_ref();
    let image = image_or_placeholder(ImageData::from_file(path), &format!("texture {:?}", path));

    let wrap = if repeat {
        glow::REPEAT
    } else {
        glow::CLAMP_TO_EDGE
    };

    unsafe {
        let raw = gl.create_texture().map_err(TextureError::Allocate)?;
        gl.bind_texture(glow::TEXTURE_2D, Some(raw));
        upload_image(gl, glow::TEXTURE_2D, &image);
        gl.generate_mipmap(glow::TEXTURE_2D);

        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, wrap as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, wrap as i32);
        gl.tex_parameter_i32(
            glow::TEXTURE_2D,
            glow::TEXTURE_MIN_FILTER,
            glow::LINEAR_MIPMAP_LINEAR as i32,
        );
        gl.tex_parameter_i32(
            glow::TEXTURE_2D,
            glow::TEXTURE_MAG_FILTER,
            glow::LINEAR as i32,
        );
        gl.bind_texture(glow::TEXTURE_2D, None);

        Ok(raw)
    }
}

/// Load a six-face cubemap from a directory
///
/// Faces follow the `right/left/top/bottom/front/back`.png convention.
/// Face files are decoded on worker threads (CPU-only work) and joined
/// before any GL upload; missing faces warn and upload black.
pub fn load_cubemap(
    gl: &glow::Context,
    dir: impl AsRef<Path>,
) -> Result<glow::NativeTexture, TextureError> {
    let dir = dir.as_ref();

    let decoded: Vec<Result<ImageData, AssetError>> = std::thread::scope(|scope| {
        let handles: Vec<_> = CUBEMAP_FACES
            .iter()
            .map(|face| {
                let path = dir.join(format!("{face}.png"));
                scope.spawn(move || ImageData::from_file(&path))
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(AssetError::LoadFailed("decoder thread panicked".into())))
            })
            .collect()
    });

    unsafe {
        let raw = gl.create_texture().map_err(TextureError::Allocate)?;
        gl.bind_texture(glow::TEXTURE_CUBE_MAP, Some(raw));

        for (i, (face, result)) in CUBEMAP_FACES.iter().zip(decoded).enumerate() {
            let image = image_or_placeholder(
                result,
                &format!("cubemap face {:?}", dir.join(format!("{face}.png"))),
            );
            upload_image(gl, glow::TEXTURE_CUBE_MAP_POSITIVE_X + i as u32, &image);
        }

        gl.tex_parameter_i32(
            glow::TEXTURE_CUBE_MAP,
            glow::TEXTURE_MIN_FILTER,
            glow::LINEAR as i32,
        );
        gl.tex_parameter_i32(
            glow::TEXTURE_CUBE_MAP,
            glow::TEXTURE_MAG_FILTER,
            glow::LINEAR as i32,
        );
        gl.tex_parameter_i32(
            glow::TEXTURE_CUBE_MAP,
            glow::TEXTURE_WRAP_S,
            glow::CLAMP_TO_EDGE as i32,
        );
        gl.tex_parameter_i32(
            glow::TEXTURE_CUBE_MAP,
            glow::TEXTURE_WRAP_T,
            glow::CLAMP_TO_EDGE as i32,
        );
        gl.tex_parameter_i32(
            glow::TEXTURE_CUBE_MAP,
            glow::TEXTURE_WRAP_R,
            glow::CLAMP_TO_EDGE as i32,
        );
        gl.bind_texture(glow::TEXTURE_CUBE_MAP, None);

        Ok(raw)
    }
}
