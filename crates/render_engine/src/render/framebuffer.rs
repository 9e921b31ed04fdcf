//! Framebuffer factory
//!
//! Off-screen render targets binding exactly one color texture, with an
//! optional combined depth/stencil renderbuffer. Completeness is validated
//! immediately after construction; an incomplete framebuffer is a
//! construction error, not a retryable condition.

use glow::HasContext;
use thiserror::Error;

/// Framebuffer construction errors
#[derive(Error, Debug)]
pub enum FramebufferError {
    /// The driver refused to allocate a framebuffer or renderbuffer object
    #[error("failed to allocate GL framebuffer object: {0}")]
    Allocate(String),

    /// The assembled framebuffer failed the completeness check
    #[error("framebuffer incomplete (status 0x{status:x})")]
    Incomplete {
        /// Raw GL completeness status
        status: u32,
    },
}

/// An off-screen render target with one color attachment
///
/// Lives for the whole process once cached; only the failure path during
/// construction deletes GL objects.
pub struct Framebuffer {
    raw: glow::NativeFramebuffer,
    depth: Option<glow::NativeRenderbuffer>,
}

impl Framebuffer {
    /// Build a framebuffer around the given color texture
    ///
    /// Attaches the texture as color attachment 0. When `wants_depth` is
    /// set, a `DEPTH24_STENCIL8` renderbuffer sized `width` x `height` is
    /// attached as well. Fails (with a logged diagnostic) if the resulting
    /// framebuffer is incomplete; callers at startup must treat that as a
    /// fatal misconfiguration.
    pub fn for_color_target(
        gl: &glow::Context,
        color_texture: glow::NativeTexture,
        wants_depth: bool,
        width: i32,
        height: i32,
    ) -> Result<Self, FramebufferError> {
        unsafe {
            let raw = gl.create_framebuffer().map_err(FramebufferError::Allocate)?;
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(raw));
            gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                Some(color_texture),
                0,
            );

            let depth = if wants_depth {
                let rbo = match gl.create_renderbuffer() {
                    Ok(rbo) => rbo,
                    Err(e) => {
                        gl.bind_framebuffer(glow::FRAMEBUFFER, None);
                        gl.delete_framebuffer(raw);
                        return Err(FramebufferError::Allocate(e));
                    }
                };
                gl.bind_renderbuffer(glow::RENDERBUFFER, Some(rbo));
                gl.renderbuffer_storage(glow::RENDERBUFFER, glow::DEPTH24_STENCIL8, width, height);
                gl.framebuffer_renderbuffer(
                    glow::FRAMEBUFFER,
                    glow::DEPTH_STENCIL_ATTACHMENT,
                    glow::RENDERBUFFER,
                    Some(rbo),
                );
                gl.bind_renderbuffer(glow::RENDERBUFFER, None);
                Some(rbo)
            } else {
                None
            };

            let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            if status != glow::FRAMEBUFFER_COMPLETE {
                log::error!("Framebuffer is not complete (status 0x{:x})", status);
                gl.delete_framebuffer(raw);
                if let Some(rbo) = depth {
                    gl.delete_renderbuffer(rbo);
                }
                return Err(FramebufferError::Incomplete { status });
            }

            Ok(Self { raw, depth })
        }
    }

    /// Convenience constructor for a depth-less pass target
    ///
    /// Dimensions only size the depth renderbuffer, so none are needed here.
    pub fn for_pass_target(
        gl: &glow::Context,
        target: glow::NativeTexture,
    ) -> Result<Self, FramebufferError> {
        Self::for_color_target(gl, target, false, 0, 0)
    }

    /// The underlying GL handle
    pub fn raw(&self) -> glow::NativeFramebuffer {
        self.raw
    }

    /// The depth/stencil renderbuffer, when one was requested
    pub fn depth_renderbuffer(&self) -> Option<glow::NativeRenderbuffer> {
        self.depth
    }
}
