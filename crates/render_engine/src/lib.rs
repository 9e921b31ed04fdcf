//! # Render Engine
//!
//! A small OpenGL render-pass orchestration core for fragment-shader-driven
//! demos.
//!
//! ## Features
//!
//! - **Render graph**: fixed pipeline of fullscreen passes (scene →
//!   brightness → multi-level bloom → composite → tonemap → present)
//! - **Resource caching**: framebuffers and shader programs are built once
//!   and reused every frame
//! - **Dynamic uniforms**: named scalar/texture/cubemap parameters bound at
//!   draw time, independent of shader layout
//! - **Asset loading**: 2D textures and six-face cubemaps with placeholder
//!   fallbacks
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use render_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut window = GlWindow::new("demo", 1920, 1080)?;
//!     let mut cache = RenderResourceCache::new();
//!     let quad = FullscreenQuad::new(window.gl())?;
//!     let mut graph = RenderGraph::new(1920, 1080);
//!
//!     let scene = SceneInputs {
//!         color_map: load_texture_2d(window.gl(), "assets/color_map.png", false)?,
//!         galaxy: load_cubemap(window.gl(), "assets/skybox")?,
//!     };
//!
//!     while !window.should_close() {
//!         window.poll_events();
//!         let time = window.time();
//!         let settings = FrameSettings::default();
//!         graph.render_frame(window.gl(), &mut cache, &quad, time, &settings, &scene)?;
//!         window.swap_buffers();
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Re-exported so applications share the engine's GL binding without pinning
// their own copy of the crate.
pub use glow;

pub mod assets;
pub mod render;

/// Common imports for engine users
pub mod prelude {
    pub use crate::render::{
        cache::RenderResourceCache,
        graph::{FrameSettings, RenderGraph, SceneInputs, MAX_BLOOM_LEVELS},
        pass::{FullscreenQuad, PassDescriptor, PassTarget},
        texture::{load_cubemap, load_texture_2d, ColorFormat, Texture},
        window::GlWindow,
        RenderError,
    };
}
