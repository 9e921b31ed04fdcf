//! Render graph and pass sequencer
//!
//! Each frame executes a fixed DAG of fullscreen passes:
//!
//! 1. main scene → 2. brightness extraction → 3. K-level bloom downsample
//! chain → 4. K-level upsample chain → 5. composite → 6. tonemap →
//! 7. present.
//!
//! Splitting bloom into symmetric power-of-two downsample/upsample chains
//! bounds the per-pass cost to a small fixed kernel regardless of blur
//! radius, and blending each level's pre-downsample input back in during
//! upsampling avoids the ringing of a naive single-pass blur. The chain
//! depth K is the one piece of per-frame-tunable topology: it changes blur
//! radius and cost in one control.
//!
//! Planning a frame (the ordered descriptor list) is pure bookkeeping;
//! executing it performs the GL work. Intermediate textures are allocated
//! once, lazily, for the maximum chain depth and reused every frame;
//! steady-state frames allocate nothing.

use std::collections::BTreeMap;

use crate::render::cache::RenderResourceCache;
use crate::render::pass::{execute_pass, FullscreenQuad, PassDescriptor, PassTarget};
use crate::render::texture::{Texture, TextureError};
use crate::render::RenderResult;

/// Upper bound on bloom chain depth; pyramid textures are allocated for
/// this many levels regardless of the per-frame iteration count
pub const MAX_BLOOM_LEVELS: usize = 8;

const SCENE_FRAG: &str = "shader/blackhole_main.frag";
const BRIGHTNESS_FRAG: &str = "shader/bloom_brightness_pass.frag";
const DOWNSAMPLE_FRAG: &str = "shader/bloom_downsample.frag";
const UPSAMPLE_FRAG: &str = "shader/bloom_upsample.frag";
const COMPOSITE_FRAG: &str = "shader/bloom_composite.frag";
const TONEMAP_FRAG: &str = "shader/tonemapping.frag";
const PRESENT_FRAG: &str = "shader/passthrough.frag";

/// Content textures consumed by the main scene pass
#[derive(Debug, Clone, Copy)]
pub struct SceneInputs {
    /// 2D lookup texture for accretion-disk coloring
    pub color_map: glow::NativeTexture,
    /// Panoramic background cubemap
    pub galaxy: glow::NativeTexture,
}

/// Per-frame tunables read back from the UI layer
#[derive(Debug, Clone)]
pub struct FrameSettings {
    /// Named scalars forwarded verbatim to the main scene pass
    /// (toggles, sliders, mouse position)
    pub scene_scalars: BTreeMap<String, f32>,
    /// Bloom chain depth, clamped to `1..=MAX_BLOOM_LEVELS`
    pub bloom_iterations: usize,
    /// Blend factor of the bloom layer in the composite pass
    pub bloom_strength: f32,
    /// Whether the tonemap pass applies its curve or passes through
    pub tonemapping_enabled: bool,
    /// Gamma exponent for the tonemap pass
    pub gamma: f32,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            scene_scalars: BTreeMap::new(),
            bloom_iterations: MAX_BLOOM_LEVELS,
            bloom_strength: 0.1,
            tonemapping_enabled: true,
            gamma: 2.5,
        }
    }
}

/// The intermediate render targets of one frame
///
/// All HDR except the tonemapped output, which is display-ready. Allocated
/// once for the maximum chain depth; reducing the per-frame iteration count
/// simply leaves the coarsest levels untouched.
pub struct FrameTargets {
    scene: Texture,
    brightness: Texture,
    downsampled: Vec<Texture>,
    upsampled: Vec<Texture>,
    composite: Texture,
    tonemapped: Texture,
}

impl FrameTargets {
    /// Allocate every pipeline texture for a base resolution
    ///
    /// Downsample level `i` is `(width >> (i+1), height >> (i+1))`;
    /// upsample level `i` is `(width >> i, height >> i)`.
    pub fn allocate(gl: &glow::Context, width: i32, height: i32) -> Result<Self, TextureError> {
        let scene = Texture::color_target(gl, width, height, true)?;
        let brightness = Texture::color_target(gl, width, height, true)?;

        let mut downsampled = Vec::with_capacity(MAX_BLOOM_LEVELS);
        let mut upsampled = Vec::with_capacity(MAX_BLOOM_LEVELS);
        for level in 0..MAX_BLOOM_LEVELS as i32 {
            downsampled.push(Texture::color_target(
                gl,
                width >> (level + 1),
                height >> (level + 1),
                true,
            )?);
            upsampled.push(Texture::color_target(
                gl,
                width >> level,
                height >> level,
                true,
            )?);
        }

        let composite = Texture::color_target(gl, width, height, true)?;
        let tonemapped = Texture::color_target(gl, width, height, false)?;

        Ok(Self {
            scene,
            brightness,
            downsampled,
            upsampled,
            composite,
            tonemapped,
        })
    }
}

/// Plan the ordered pass list for one frame
///
/// Pure: reads target handles and settings, allocates nothing on the GPU.
/// The list always ends with the present pass to the default framebuffer.
pub fn plan_frame(
    targets: &FrameTargets,
    settings: &FrameSettings,
    scene: &SceneInputs,
) -> Vec<PassDescriptor> {
    let width = targets.scene.width();
    let height = targets.scene.height();
    let iterations = settings.bloom_iterations.clamp(1, MAX_BLOOM_LEVELS);

    let mut passes = Vec::with_capacity(5 + 2 * iterations);

    // Main scene: procedural, fragment-shader-driven, no geometry beyond
    // the shared quad
    let mut main_pass = PassDescriptor::new(
        SCENE_FRAG,
        PassTarget::Texture(targets.scene.raw()),
        width,
        height,
    )
    .with_texture("colorMap", scene.color_map)
    .with_cubemap("galaxy", scene.galaxy);
    main_pass.scalar_uniforms.extend(
        settings
            .scene_scalars
            .iter()
            .map(|(name, value)| (name.clone(), *value)),
    );
    passes.push(main_pass);

    // Brightness extraction feeding the bloom pyramid
    passes.push(
        PassDescriptor::new(
            BRIGHTNESS_FRAG,
            PassTarget::Texture(targets.brightness.raw()),
            width,
            height,
        )
        .with_texture("texture0", targets.scene.raw()),
    );

    // Downsample chain: each level halves the previous one
    for level in 0..iterations {
        let input = if level == 0 {
            targets.brightness.raw()
        } else {
            targets.downsampled[level - 1].raw()
        };
        passes.push(
            PassDescriptor::new(
                DOWNSAMPLE_FRAG,
                PassTarget::Texture(targets.downsampled[level].raw()),
                width >> (level + 1),
                height >> (level + 1),
            )
            .with_texture("texture0", input),
        );
    }

    // Upsample chain: blend the next-coarser result with the same level's
    // pre-downsample input
    for level in (0..iterations).rev() {
        let coarse = if level == iterations - 1 {
            targets.downsampled[level].raw()
        } else {
            targets.upsampled[level + 1].raw()
        };
        let blend = if level == 0 {
            targets.brightness.raw()
        } else {
            targets.downsampled[level - 1].raw()
        };
        passes.push(
            PassDescriptor::new(
                UPSAMPLE_FRAG,
                PassTarget::Texture(targets.upsampled[level].raw()),
                width >> level,
                height >> level,
            )
            .with_texture("texture0", coarse)
            .with_texture("texture1", blend),
        );
    }

    // Composite the scene with the finest bloom level
    passes.push(
        PassDescriptor::new(
            COMPOSITE_FRAG,
            PassTarget::Texture(targets.composite.raw()),
            width,
            height,
        )
        .with_texture("texture0", targets.scene.raw())
        .with_texture("texture1", targets.upsampled[0].raw())
        .with_scalar("bloomStrength", settings.bloom_strength),
    );

    // Tonemap into the display-ready target
    passes.push(
        PassDescriptor::new(
            TONEMAP_FRAG,
            PassTarget::Texture(targets.tonemapped.raw()),
            width,
            height,
        )
        .with_texture("texture0", targets.composite.raw())
        .with_toggle("tonemappingEnabled", settings.tonemapping_enabled)
        .with_scalar("gamma", settings.gamma),
    );

    // Present to the default framebuffer
    passes.push(
        PassDescriptor::new(PRESENT_FRAG, PassTarget::Screen, width, height)
            .with_texture("texture0", targets.tonemapped.raw()),
    );

    passes
}

/// The top-level pass sequencer
///
/// Owns the intermediate targets and drives the fixed pipeline each frame.
/// Pass-to-pass ordering is a true data dependency (every pass consumes
/// the previous stage's output texture), so execution is strictly
/// sequential on the render thread.
pub struct RenderGraph {
    width: i32,
    height: i32,
    targets: Option<FrameTargets>,
}

impl RenderGraph {
    /// Create a graph for a fixed base resolution
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            targets: None,
        }
    }

    /// Base render width in pixels
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Base render height in pixels
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Plan and execute every pass of one frame
    ///
    /// The first call allocates the intermediate targets; later calls reuse
    /// them. Resource construction failures (shaders, framebuffers) can
    /// only occur while the cache is cold and are fatal to the caller.
    pub fn render_frame(
        &mut self,
        gl: &glow::Context,
        cache: &mut RenderResourceCache,
        quad: &FullscreenQuad,
        time: f32,
        settings: &FrameSettings,
        scene: &SceneInputs,
    ) -> RenderResult<()> {
        if self.targets.is_none() {
            log::info!(
                "Allocating frame targets and bloom pyramid at {}x{}",
                self.width,
                self.height
            );
            self.targets = Some(FrameTargets::allocate(gl, self.width, self.height)?);
        }
        let targets = self
            .targets
            .as_ref()
            .expect("frame targets allocated above");

        for desc in plan_frame(targets, settings, scene) {
            execute_pass(gl, cache, quad, time, &desc)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::texture::ColorFormat;
    use std::num::NonZeroU32;
    use std::path::Path;

    fn tex(id: u32, width: i32, height: i32, hdr: bool) -> Texture {
        Texture::from_raw_parts(
            glow::NativeTexture(NonZeroU32::new(id).unwrap()),
            width,
            height,
            ColorFormat::from_hdr(hdr),
        )
    }

    fn test_targets(width: i32, height: i32) -> FrameTargets {
        let mut next_id = 0;
        let mut fresh = |w, h, hdr| {
            next_id += 1;
            tex(next_id, w, h, hdr)
        };

        FrameTargets {
            scene: fresh(width, height, true),
            brightness: fresh(width, height, true),
            downsampled: (0..MAX_BLOOM_LEVELS as i32)
                .map(|i| fresh(width >> (i + 1), height >> (i + 1), true))
                .collect(),
            upsampled: (0..MAX_BLOOM_LEVELS as i32)
                .map(|i| fresh(width >> i, height >> i, true))
                .collect(),
            composite: fresh(width, height, true),
            tonemapped: fresh(width, height, false),
        }
    }

    fn test_inputs() -> SceneInputs {
        SceneInputs {
            color_map: glow::NativeTexture(NonZeroU32::new(100).unwrap()),
            galaxy: glow::NativeTexture(NonZeroU32::new(101).unwrap()),
        }
    }

    fn settings_with_iterations(iterations: usize) -> FrameSettings {
        FrameSettings {
            bloom_iterations: iterations,
            ..FrameSettings::default()
        }
    }

    fn frag_name(desc: &PassDescriptor) -> &str {
        desc.frag_shader.to_str().unwrap()
    }

    #[test]
    fn test_pass_counts_match_iteration_count() {
        let targets = test_targets(1920, 1080);
        for iterations in 1..=MAX_BLOOM_LEVELS {
            let passes = plan_frame(
                &targets,
                &settings_with_iterations(iterations),
                &test_inputs(),
            );
            // scene + brightness + K down + K up + composite + tonemap + present
            assert_eq!(passes.len(), 5 + 2 * iterations);

            let downs = passes
                .iter()
                .filter(|p| frag_name(p) == DOWNSAMPLE_FRAG)
                .count();
            let ups = passes
                .iter()
                .filter(|p| frag_name(p) == UPSAMPLE_FRAG)
                .count();
            assert_eq!(downs, iterations);
            assert_eq!(ups, iterations);
        }
    }

    #[test]
    fn test_downsample_resolutions_halve_per_level() {
        let targets = test_targets(1920, 1080);
        let passes = plan_frame(
            &targets,
            &settings_with_iterations(MAX_BLOOM_LEVELS),
            &test_inputs(),
        );

        let downs: Vec<_> = passes
            .iter()
            .filter(|p| frag_name(p) == DOWNSAMPLE_FRAG)
            .collect();
        for (level, pass) in downs.iter().enumerate() {
            let level = level as i32;
            assert_eq!(pass.width, 1920 >> (level + 1));
            assert_eq!(pass.height, 1080 >> (level + 1));
        }
        // End-to-end scenario: level 0 is 960x540, level 7 is 7x4
        assert_eq!((downs[0].width, downs[0].height), (960, 540));
        assert_eq!((downs[7].width, downs[7].height), (7, 4));
    }

    #[test]
    fn test_upsample_resolutions_mirror_the_chain() {
        let targets = test_targets(1920, 1080);
        let passes = plan_frame(
            &targets,
            &settings_with_iterations(MAX_BLOOM_LEVELS),
            &test_inputs(),
        );

        // Upsample passes run coarsest-first (level 7 down to 0)
        let ups: Vec<_> = passes
            .iter()
            .filter(|p| frag_name(p) == UPSAMPLE_FRAG)
            .collect();
        for (index, pass) in ups.iter().enumerate() {
            let level = (MAX_BLOOM_LEVELS - 1 - index) as i32;
            assert_eq!(pass.width, 1920 >> level);
            assert_eq!(pass.height, 1080 >> level);
        }
        assert_eq!((ups[0].width, ups[0].height), (15, 8));
        assert_eq!(
            (ups[MAX_BLOOM_LEVELS - 1].width, ups[MAX_BLOOM_LEVELS - 1].height),
            (1920, 1080)
        );
    }

    #[test]
    fn test_upsample_blend_inputs() {
        let targets = test_targets(1920, 1080);
        let k = 4;
        let passes = plan_frame(&targets, &settings_with_iterations(k), &test_inputs());

        let ups: Vec<_> = passes
            .iter()
            .filter(|p| frag_name(p) == UPSAMPLE_FRAG)
            .collect();

        // Coarsest level reads the final downsample output
        assert_eq!(
            ups[0].texture_uniforms["texture0"],
            targets.downsampled[k - 1].raw()
        );
        // Finest level blends against the brightness texture
        let finest = ups[k - 1];
        assert_eq!(finest.texture_uniforms["texture1"], targets.brightness.raw());
        // Interior levels blend against the same level's pre-downsample input
        assert_eq!(
            ups[1].texture_uniforms["texture1"],
            targets.downsampled[k - 3].raw()
        );
    }

    #[test]
    fn test_pipeline_order_and_terminal_present() {
        let targets = test_targets(1920, 1080);
        let passes = plan_frame(&targets, &settings_with_iterations(2), &test_inputs());

        let order: Vec<_> = passes.iter().map(frag_name).collect();
        assert_eq!(
            order,
            vec![
                SCENE_FRAG,
                BRIGHTNESS_FRAG,
                DOWNSAMPLE_FRAG,
                DOWNSAMPLE_FRAG,
                UPSAMPLE_FRAG,
                UPSAMPLE_FRAG,
                COMPOSITE_FRAG,
                TONEMAP_FRAG,
                PRESENT_FRAG,
            ]
        );

        let present = passes.last().unwrap();
        assert_eq!(present.target, PassTarget::Screen);
        assert_eq!((present.width, present.height), (1920, 1080));
        // Composite and tonemap both run at base resolution
        let composite = &passes[passes.len() - 3];
        let tonemap = &passes[passes.len() - 2];
        assert_eq!((composite.width, composite.height), (1920, 1080));
        assert_eq!((tonemap.width, tonemap.height), (1920, 1080));
    }

    #[test]
    fn test_main_pass_carries_scene_inputs_and_scalars() {
        let targets = test_targets(1920, 1080);
        let inputs = test_inputs();
        let mut settings = settings_with_iterations(8);
        settings
            .scene_scalars
            .insert("mouseX".to_string(), 42.0);
        settings
            .scene_scalars
            .insert("adiskEnabled".to_string(), 1.0);

        let passes = plan_frame(&targets, &settings, &inputs);
        let main = &passes[0];

        assert_eq!(frag_name(main), SCENE_FRAG);
        assert_eq!(main.texture_uniforms["colorMap"], inputs.color_map);
        assert_eq!(main.cubemap_uniforms["galaxy"], inputs.galaxy);
        assert_eq!(main.scalar_uniforms["mouseX"], 42.0);
        assert_eq!(main.scalar_uniforms["adiskEnabled"], 1.0);
    }

    #[test]
    fn test_changing_iteration_count_replans_without_reallocation() {
        let targets = test_targets(1920, 1080);

        // The same target set serves every chain depth; shrinking and
        // growing K only changes which pyramid levels the plan touches
        for &iterations in &[8usize, 3, 1, 8] {
            let passes = plan_frame(
                &targets,
                &settings_with_iterations(iterations),
                &test_inputs(),
            );
            assert_eq!(passes.len(), 5 + 2 * iterations);
            for pass in &passes {
                assert!(pass.width >= 1);
                assert!(pass.height >= 1);
            }
        }
    }

    #[test]
    fn test_iteration_count_is_clamped() {
        let targets = test_targets(1920, 1080);
        let passes = plan_frame(&targets, &settings_with_iterations(0), &test_inputs());
        assert_eq!(passes.len(), 5 + 2);

        let passes = plan_frame(&targets, &settings_with_iterations(64), &test_inputs());
        assert_eq!(passes.len(), 5 + 2 * MAX_BLOOM_LEVELS);
    }

    #[test]
    fn test_default_vertex_shader_on_every_pass() {
        let targets = test_targets(1920, 1080);
        let passes = plan_frame(&targets, &settings_with_iterations(8), &test_inputs());
        for pass in &passes {
            assert_eq!(
                pass.vert_shader,
                Path::new(crate::render::pass::DEFAULT_VERTEX_SHADER)
            );
        }
    }
}
