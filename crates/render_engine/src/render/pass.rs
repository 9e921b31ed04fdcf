//! Render passes and the uniform binding protocol
//!
//! A [`PassDescriptor`] describes one fullscreen draw: a fragment shader,
//! named scalar/texture/cubemap uniforms, and a render target. Descriptors
//! are built fresh each frame and consumed immediately by
//! [`execute_pass`]; GPU objects they resolve to are memoized in the
//! [`RenderResourceCache`](crate::render::cache::RenderResourceCache).
//!
//! Uniform maps are `BTreeMap`s: texture-unit assignment depends on map
//! iteration order, and `BTreeMap`'s key-sorted order keeps that assignment
//! deterministic across frames and construction orders.

use std::collections::BTreeMap;
use std::path::PathBuf;

use glow::HasContext;

use crate::render::cache::RenderResourceCache;
use crate::render::{RenderError, RenderResult};

/// The vertex shader used when a pass does not name one
pub const DEFAULT_VERTEX_SHADER: &str = "shader/simple.vert";

/// Where a pass writes its output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassTarget {
    /// An off-screen color texture
    Texture(glow::NativeTexture),
    /// The default framebuffer (the visible swapchain image)
    Screen,
}

/// Description of one fullscreen draw invocation
///
/// A value object: constructed each frame, consumed by the sequencer, never
/// persisted. The same fields may be reused across heterogeneous shaders;
/// a named uniform the shader does not declare is skipped with a warning.
#[derive(Debug, Clone)]
pub struct PassDescriptor {
    /// Vertex shader path; defaults to the fullscreen passthrough
    pub vert_shader: PathBuf,
    /// Fragment shader path; also identifies the pass for program caching
    pub frag_shader: PathBuf,
    /// Named float uniforms
    pub scalar_uniforms: BTreeMap<String, f32>,
    /// Named 2D-texture uniforms; bound to units before cubemaps
    pub texture_uniforms: BTreeMap<String, glow::NativeTexture>,
    /// Named cubemap uniforms; bound to units after 2D textures
    pub cubemap_uniforms: BTreeMap<String, glow::NativeTexture>,
    /// Output target
    pub target: PassTarget,
    /// Output width in pixels
    pub width: i32,
    /// Output height in pixels
    pub height: i32,
}

impl PassDescriptor {
    /// Create a descriptor with the default passthrough vertex shader
    pub fn new(
        frag_shader: impl Into<PathBuf>,
        target: PassTarget,
        width: i32,
        height: i32,
    ) -> Self {
        Self {
            vert_shader: PathBuf::from(DEFAULT_VERTEX_SHADER),
            frag_shader: frag_shader.into(),
            scalar_uniforms: BTreeMap::new(),
            texture_uniforms: BTreeMap::new(),
            cubemap_uniforms: BTreeMap::new(),
            target,
            width,
            height,
        }
    }

    /// Add a named float uniform
    pub fn with_scalar(mut self, name: impl Into<String>, value: f32) -> Self {
        self.scalar_uniforms.insert(name.into(), value);
        self
    }

    /// Add a named boolean uniform, encoded as 0.0 / 1.0
    pub fn with_toggle(self, name: impl Into<String>, enabled: bool) -> Self {
        self.with_scalar(name, if enabled { 1.0 } else { 0.0 })
    }

    /// Add a named 2D-texture uniform
    pub fn with_texture(mut self, name: impl Into<String>, texture: glow::NativeTexture) -> Self {
        self.texture_uniforms.insert(name.into(), texture);
        self
    }

    /// Add a named cubemap uniform
    pub fn with_cubemap(mut self, name: impl Into<String>, texture: glow::NativeTexture) -> Self {
        self.cubemap_uniforms.insert(name.into(), texture);
        self
    }
}

/// Kind of sampler a texture unit is bound for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerKind {
    /// `sampler2D`
    Texture2d,
    /// `samplerCube`
    Cubemap,
}

impl SamplerKind {
    fn gl_target(self) -> u32 {
        match self {
            Self::Texture2d => glow::TEXTURE_2D,
            Self::Cubemap => glow::TEXTURE_CUBE_MAP,
        }
    }
}

/// One entry of a pass's texture-unit assignment plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerBinding<'a> {
    /// Uniform name in the shader
    pub name: &'a str,
    /// Sampler kind (selects the GL bind target)
    pub kind: SamplerKind,
    /// Texture unit index, starting at 0
    pub unit: u32,
    /// Texture handle to bind
    pub texture: glow::NativeTexture,
}

/// Compute the texture-unit assignment for a descriptor
///
/// Units are assigned in map-iteration order, 2D textures first, cubemaps
/// after. Pure bookkeeping, so the contract is testable without a GL
/// context.
pub fn sampler_bindings(desc: &PassDescriptor) -> Vec<SamplerBinding<'_>> {
    let mut bindings = Vec::with_capacity(desc.texture_uniforms.len() + desc.cubemap_uniforms.len());
    let mut unit = 0u32;

    for (name, texture) in &desc.texture_uniforms {
        bindings.push(SamplerBinding {
            name,
            kind: SamplerKind::Texture2d,
            unit,
            texture: *texture,
        });
        unit += 1;
    }
    for (name, texture) in &desc.cubemap_uniforms {
        bindings.push(SamplerBinding {
            name,
            kind: SamplerKind::Cubemap,
            unit,
            texture: *texture,
        });
        unit += 1;
    }

    bindings
}

/// The fullscreen quad geometry shared by every pass
///
/// Two triangles covering clip space; the only geometry in the renderer.
pub struct FullscreenQuad {
    vao: glow::NativeVertexArray,
    _vbo: glow::NativeBuffer,
}

impl FullscreenQuad {
    const VERTICES: [f32; 18] = [
        -1.0, -1.0, 0.0, //
        -1.0, 1.0, 0.0, //
        1.0, 1.0, 0.0, //
        1.0, 1.0, 0.0, //
        1.0, -1.0, 0.0, //
        -1.0, -1.0, 0.0, //
    ];

    /// Upload the quad geometry
    pub fn new(gl: &glow::Context) -> RenderResult<Self> {
        unsafe {
            let vao = gl.create_vertex_array().map_err(RenderError::Allocate)?;
            gl.bind_vertex_array(Some(vao));

            let vbo = gl.create_buffer().map_err(RenderError::Allocate)?;
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&Self::VERTICES),
                glow::STATIC_DRAW,
            );

            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, 0, 0);

            gl.bind_vertex_array(None);

            Ok(Self { vao, _vbo: vbo })
        }
    }

    /// Bind the quad's vertex array
    pub fn bind(&self, gl: &glow::Context) {
        unsafe {
            gl.bind_vertex_array(Some(self.vao));
        }
    }
}

/// Execute one pass: resolve cached resources, bind uniforms, draw
///
/// Resolves the target framebuffer and shader program through the cache
/// (constructing them on first use, the only failing path, and a fatal one
/// at startup), binds the implicit `resolution`/`time` uniforms, then the
/// descriptor's scalars and samplers, and issues the fullscreen draw.
pub fn execute_pass(
    gl: &glow::Context,
    cache: &mut RenderResourceCache,
    quad: &FullscreenQuad,
    time: f32,
    desc: &PassDescriptor,
) -> RenderResult<()> {
    let framebuffer = match desc.target {
        PassTarget::Texture(texture) => Some(cache.resolve_framebuffer(gl, texture)?),
        PassTarget::Screen => None,
    };
    let program = cache.resolve_program(gl, &desc.vert_shader, &desc.frag_shader)?;

    unsafe {
        gl.bind_framebuffer(glow::FRAMEBUFFER, framebuffer);
        gl.viewport(0, 0, desc.width, desc.height);
        gl.disable(glow::DEPTH_TEST);

        // Distinct clear colors make an accidentally-unwritten region
        // visible: cyan off-screen, red on the swapchain image
        match desc.target {
            PassTarget::Texture(_) => gl.clear_color(0.0, 1.0, 1.0, 1.0),
            PassTarget::Screen => gl.clear_color(1.0, 0.0, 0.0, 1.0),
        }
        gl.clear(glow::COLOR_BUFFER_BIT);

        gl.use_program(Some(program));

        // Implicit uniforms, set before any user uniforms; shaders that do
        // not declare them are simply left alone
        if let Some(loc) = gl.get_uniform_location(program, "resolution") {
            gl.uniform_2_f32(Some(&loc), desc.width as f32, desc.height as f32);
        }
        if let Some(loc) = gl.get_uniform_location(program, "time") {
            gl.uniform_1_f32(Some(&loc), time);
        }

        for (name, value) in &desc.scalar_uniforms {
            match gl.get_uniform_location(program, name) {
                Some(loc) => gl.uniform_1_f32(Some(&loc), *value),
                None => log::warn!(
                    "uniform {} is not declared by {:?}",
                    name,
                    desc.frag_shader
                ),
            }
        }

        for binding in sampler_bindings(desc) {
            match gl.get_uniform_location(program, binding.name) {
                Some(loc) => {
                    gl.uniform_1_i32(Some(&loc), binding.unit as i32);
                    gl.active_texture(glow::TEXTURE0 + binding.unit);
                    gl.bind_texture(binding.kind.gl_target(), Some(binding.texture));
                }
                None => log::warn!(
                    "uniform {} is not declared by {:?}",
                    binding.name,
                    desc.frag_shader
                ),
            }
        }

        quad.bind(gl);
        gl.draw_arrays(glow::TRIANGLES, 0, 6);

        gl.use_program(None);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroU32;

    fn tex(id: u32) -> glow::NativeTexture {
        glow::NativeTexture(NonZeroU32::new(id).unwrap())
    }

    #[test]
    fn test_builder_defaults_to_passthrough_vertex_shader() {
        let desc = PassDescriptor::new("shader/tonemapping.frag", PassTarget::Screen, 640, 360);
        assert_eq!(desc.vert_shader, PathBuf::from(DEFAULT_VERTEX_SHADER));
        assert_eq!(desc.frag_shader, PathBuf::from("shader/tonemapping.frag"));
        assert_eq!((desc.width, desc.height), (640, 360));
    }

    #[test]
    fn test_toggle_encodes_as_zero_or_one() {
        let desc = PassDescriptor::new("shader/tonemapping.frag", PassTarget::Screen, 1, 1)
            .with_toggle("tonemappingEnabled", true)
            .with_toggle("vignette", false);
        assert_eq!(desc.scalar_uniforms["tonemappingEnabled"], 1.0);
        assert_eq!(desc.scalar_uniforms["vignette"], 0.0);
    }

    #[test]
    fn test_texture_units_precede_cubemap_units() {
        let desc = PassDescriptor::new("shader/scene.frag", PassTarget::Texture(tex(9)), 64, 64)
            .with_cubemap("galaxy", tex(1))
            .with_texture("colorMap", tex(2))
            .with_texture("noise", tex(3));

        let bindings = sampler_bindings(&desc);
        let plan: Vec<_> = bindings
            .iter()
            .map(|b| (b.name, b.kind, b.unit))
            .collect();
        assert_eq!(
            plan,
            vec![
                ("colorMap", SamplerKind::Texture2d, 0),
                ("noise", SamplerKind::Texture2d, 1),
                ("galaxy", SamplerKind::Cubemap, 2),
            ]
        );
    }

    #[test]
    fn test_unit_assignment_ignores_construction_order() {
        let a = PassDescriptor::new("shader/f.frag", PassTarget::Screen, 1, 1)
            .with_texture("alpha", tex(1))
            .with_scalar("gamma", 2.5)
            .with_texture("beta", tex(2));
        let b = PassDescriptor::new("shader/f.frag", PassTarget::Screen, 1, 1)
            .with_texture("beta", tex(2))
            .with_texture("alpha", tex(1))
            .with_scalar("gamma", 2.5);

        assert_eq!(sampler_bindings(&a), sampler_bindings(&b));
    }

    #[test]
    fn test_empty_descriptor_has_no_bindings() {
        let desc = PassDescriptor::new("shader/f.frag", PassTarget::Screen, 1, 1);
        assert!(sampler_bindings(&desc).is_empty());
    }
}
