//! Keyboard-driven tunables
//!
//! Every toggle and slider the render pipeline exposes, with its default
//! and range. The frame loop reads the current values back into the pass
//! settings each frame; nothing here touches the render graph directly.
//!
//! Bindings: letter keys flip toggles, Tab cycles the selected slider,
//! Up/Down adjust it, and the bracket keys change the bloom chain depth.

use std::collections::BTreeMap;

use glfw::Key;
use render_engine::prelude::{FrameSettings, MAX_BLOOM_LEVELS};

/// Metadata of one adjustable slider
struct Slider {
    name: &'static str,
    min: f32,
    max: f32,
}

static SLIDERS: [Slider; 10] = [
    Slider { name: "cameraRoll", min: -180.0, max: 180.0 },
    Slider { name: "adiskDensityV", min: 0.0, max: 10.0 },
    Slider { name: "adiskDensityH", min: 0.0, max: 10.0 },
    Slider { name: "adiskHeight", min: 0.0, max: 1.0 },
    Slider { name: "adiskLit", min: 0.0, max: 4.0 },
    Slider { name: "adiskNoiseLOD", min: 1.0, max: 12.0 },
    Slider { name: "adiskNoiseScale", min: 0.0, max: 10.0 },
    Slider { name: "adiskSpeed", min: 0.0, max: 1.0 },
    Slider { name: "bloomStrength", min: 0.0, max: 1.0 },
    Slider { name: "gamma", min: 1.0, max: 4.0 },
];

/// Each slider moves through its range in this many steps
const ADJUST_STEPS: f32 = 50.0;

/// The demo's interactive parameters
pub struct Controls {
    pub gravitational_lensing: bool,
    pub render_black_hole: bool,
    pub mouse_control: bool,
    pub front_view: bool,
    pub top_view: bool,
    pub adisk_enabled: bool,
    pub adisk_particle: bool,
    pub tonemapping_enabled: bool,

    pub camera_roll: f32,
    pub adisk_density_v: f32,
    pub adisk_density_h: f32,
    pub adisk_height: f32,
    pub adisk_lit: f32,
    pub adisk_noise_lod: f32,
    pub adisk_noise_scale: f32,
    pub adisk_speed: f32,
    pub bloom_strength: f32,
    pub gamma: f32,

    pub bloom_iterations: usize,

    selected_slider: usize,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            gravitational_lensing: true,
            render_black_hole: true,
            mouse_control: true,
            front_view: false,
            top_view: false,
            adisk_enabled: true,
            adisk_particle: true,
            tonemapping_enabled: true,

            camera_roll: 0.0,
            adisk_density_v: 2.0,
            adisk_density_h: 4.0,
            adisk_height: 0.55,
            adisk_lit: 0.25,
            adisk_noise_lod: 5.0,
            adisk_noise_scale: 0.8,
            adisk_speed: 0.5,
            bloom_strength: 0.1,
            gamma: 2.5,

            bloom_iterations: MAX_BLOOM_LEVELS,

            selected_slider: 0,
        }
    }
}

impl Controls {
    /// Apply a key press or repeat
    pub fn handle_key(&mut self, key: Key) {
        match key {
            Key::G => self.gravitational_lensing = !self.gravitational_lensing,
            Key::H => self.render_black_hole = !self.render_black_hole,
            Key::M => self.mouse_control = !self.mouse_control,
            Key::F => self.front_view = !self.front_view,
            Key::T => self.top_view = !self.top_view,
            Key::A => self.adisk_enabled = !self.adisk_enabled,
            Key::P => self.adisk_particle = !self.adisk_particle,
            Key::O => self.tonemapping_enabled = !self.tonemapping_enabled,

            Key::Tab => {
                self.selected_slider = (self.selected_slider + 1) % SLIDERS.len();
                let slider = &SLIDERS[self.selected_slider];
                log::info!(
                    "selected slider: {} = {:.2} [{}, {}]",
                    slider.name,
                    *self.slider_value(self.selected_slider),
                    slider.min,
                    slider.max
                );
            }
            Key::Up => self.adjust_selected(1.0),
            Key::Down => self.adjust_selected(-1.0),

            Key::LeftBracket => {
                self.bloom_iterations = self.bloom_iterations.saturating_sub(1).max(1);
                log::info!("bloom iterations: {}", self.bloom_iterations);
            }
            Key::RightBracket => {
                self.bloom_iterations = (self.bloom_iterations + 1).min(MAX_BLOOM_LEVELS);
                log::info!("bloom iterations: {}", self.bloom_iterations);
            }

            _ => {}
        }
    }

    fn adjust_selected(&mut self, direction: f32) {
        let index = self.selected_slider;
        let slider = &SLIDERS[index];
        let step = (slider.max - slider.min) / ADJUST_STEPS;
        let value = self.slider_value(index);
        *value = (*value + direction * step).clamp(slider.min, slider.max);
        let value = *value;
        log::info!("{} = {:.2}", slider.name, value);
    }

    fn slider_value(&mut self, index: usize) -> &mut f32 {
        match index {
            0 => &mut self.camera_roll,
            1 => &mut self.adisk_density_v,
            2 => &mut self.adisk_density_h,
            3 => &mut self.adisk_height,
            4 => &mut self.adisk_lit,
            5 => &mut self.adisk_noise_lod,
            6 => &mut self.adisk_noise_scale,
            7 => &mut self.adisk_speed,
            8 => &mut self.bloom_strength,
            _ => &mut self.gamma,
        }
    }

    /// Assemble the per-frame pipeline settings
    ///
    /// Scene toggles encode as 0.0/1.0 scalars; the mouse position rides
    /// along as two more scalars.
    pub fn frame_settings(&self, mouse_x: f32, mouse_y: f32) -> FrameSettings {
        let mut scene_scalars = BTreeMap::new();
        let mut scalar = |name: &str, value: f32| {
            scene_scalars.insert(name.to_string(), value);
        };
        let toggle_value = |enabled: bool| if enabled { 1.0 } else { 0.0 };

        scalar("gravitationalLensing", toggle_value(self.gravitational_lensing));
        scalar("renderBlackHole", toggle_value(self.render_black_hole));
        scalar("mouseControl", toggle_value(self.mouse_control));
        scalar("frontView", toggle_value(self.front_view));
        scalar("topView", toggle_value(self.top_view));
        scalar("adiskEnabled", toggle_value(self.adisk_enabled));
        scalar("adiskParticle", toggle_value(self.adisk_particle));

        scalar("cameraRoll", self.camera_roll);
        scalar("adiskDensityV", self.adisk_density_v);
        scalar("adiskDensityH", self.adisk_density_h);
        scalar("adiskHeight", self.adisk_height);
        scalar("adiskLit", self.adisk_lit);
        scalar("adiskNoiseLOD", self.adisk_noise_lod);
        scalar("adiskNoiseScale", self.adisk_noise_scale);
        scalar("adiskSpeed", self.adisk_speed);

        scalar("mouseX", mouse_x);
        scalar("mouseY", mouse_y);

        FrameSettings {
            scene_scalars,
            bloom_iterations: self.bloom_iterations,
            bloom_strength: self.bloom_strength,
            tonemapping_enabled: self.tonemapping_enabled,
            gamma: self.gamma,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggles_flip() {
        let mut controls = Controls::default();
        assert!(controls.gravitational_lensing);
        controls.handle_key(Key::G);
        assert!(!controls.gravitational_lensing);
        controls.handle_key(Key::G);
        assert!(controls.gravitational_lensing);
    }

    #[test]
    fn test_sliders_clamp_to_range() {
        let mut controls = Controls::default();
        // First slider is cameraRoll in [-180, 180]
        for _ in 0..200 {
            controls.handle_key(Key::Up);
        }
        assert_eq!(controls.camera_roll, 180.0);
        for _ in 0..500 {
            controls.handle_key(Key::Down);
        }
        assert_eq!(controls.camera_roll, -180.0);
    }

    #[test]
    fn test_bloom_iterations_stay_in_bounds() {
        let mut controls = Controls::default();
        for _ in 0..20 {
            controls.handle_key(Key::RightBracket);
        }
        assert_eq!(controls.bloom_iterations, MAX_BLOOM_LEVELS);
        for _ in 0..20 {
            controls.handle_key(Key::LeftBracket);
        }
        assert_eq!(controls.bloom_iterations, 1);
    }

    #[test]
    fn test_tab_cycles_through_every_slider() {
        let mut controls = Controls::default();
        let start = controls.selected_slider;
        for _ in 0..SLIDERS.len() {
            controls.handle_key(Key::Tab);
        }
        assert_eq!(controls.selected_slider, start);
    }

    #[test]
    fn test_frame_settings_carry_scene_scalars() {
        let controls = Controls::default();
        let settings = controls.frame_settings(12.0, 34.0);

        assert_eq!(settings.scene_scalars["gravitationalLensing"], 1.0);
        assert_eq!(settings.scene_scalars["frontView"], 0.0);
        assert_eq!(settings.scene_scalars["adiskDensityH"], 4.0);
        assert_eq!(settings.scene_scalars["mouseX"], 12.0);
        assert_eq!(settings.scene_scalars["mouseY"], 34.0);

        // Post-processing tunables travel as dedicated fields, not scalars
        assert!(!settings.scene_scalars.contains_key("gamma"));
        assert_eq!(settings.bloom_iterations, MAX_BLOOM_LEVELS);
        assert_eq!(settings.gamma, 2.5);
        assert!(settings.tonemapping_enabled);
    }
}
