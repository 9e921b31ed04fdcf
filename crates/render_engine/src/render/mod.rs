//! OpenGL rendering core
//!
//! Fullscreen-pass orchestration over a GL 3.3 core context: texture and
//! framebuffer factories, the shader compiler service, the uniform binding
//! protocol, the render-pass cache, and the frame graph that sequences the
//! bloom/tonemap pipeline.

pub mod cache;
pub mod framebuffer;
pub mod graph;
pub mod pass;
pub mod shader;
pub mod texture;
pub mod window;

use thiserror::Error;

pub use cache::RenderResourceCache;
pub use framebuffer::{Framebuffer, FramebufferError};
pub use graph::{FrameSettings, RenderGraph, SceneInputs};
pub use pass::{FullscreenQuad, PassDescriptor, PassTarget};
pub use shader::{ShaderError, ShaderProgram, ShaderStage};
pub use texture::{ColorFormat, Texture, TextureError};
pub use window::{GlWindow, WindowError};

/// Errors surfaced while building or executing render passes
///
/// Every variant is a startup-time construction failure; once the pass
/// cache is warm, frame execution has no failing operations.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Shader compilation, linking, or source IO failed
    #[error(transparent)]
    Shader(#[from] ShaderError),

    /// Framebuffer construction or completeness validation failed
    #[error(transparent)]
    Framebuffer(#[from] FramebufferError),

    /// Texture allocation failed
    #[error(transparent)]
    Texture(#[from] TextureError),

    /// A GL object name could not be allocated
    #[error("failed to allocate GL object: {0}")]
    Allocate(String),
}

/// Result type for render operations
pub type RenderResult<T> = Result<T, RenderError>;
