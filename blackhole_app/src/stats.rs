//! Telemetry overlay
//!
//! Samples frame rate, resident memory, GPU memory utilization, and CPU
//! temperature on a ~1 second cadence and formats them into the window
//! title. Display-only: nothing here feeds back into the render graph.

use std::time::Instant;

use render_engine::glow;
use render_engine::glow::HasContext;
use sysinfo::System;

// GL_NVX_gpu_memory_info enums; not exposed by the GL binding
const GPU_MEMORY_INFO_TOTAL_AVAILABLE_MEMORY_NVX: u32 = 0x9048;
const GPU_MEMORY_INFO_CURRENT_AVAILABLE_VIDMEM_NVX: u32 = 0x9049;

/// Seconds between telemetry refreshes
const UPDATE_INTERVAL: f32 = 1.0;

/// Periodic sampler of system and GPU telemetry
pub struct StatsOverlay {
    system: System,
    gpu_query_supported: bool,
    last_update: Instant,
    frames_since_update: u32,

    fps: f32,
    ram_mb: u64,
    gpu_percent: i32,
    temp_c: i32,
}

impl StatsOverlay {
    /// Create the sampler, probing for the GPU memory-info extension
    pub fn new(gl: &glow::Context) -> Self {
        let gpu_query_supported = gl
            .supported_extensions()
            .contains("GL_NVX_gpu_memory_info");
        if !gpu_query_supported {
            log::info!("GL_NVX_gpu_memory_info not available; GPU usage will read 0");
        }

        Self {
            system: System::new(),
            gpu_query_supported,
            last_update: Instant::now(),
            frames_since_update: 0,
            fps: 0.0,
            ram_mb: 0,
            gpu_percent: 0,
            temp_c: 0,
        }
    }

    /// Count one frame; refresh the metrics when the interval has elapsed
    ///
    /// Returns true when the metrics were refreshed and the caller should
    /// redraw the overlay (update the window title).
    pub fn frame_tick(&mut self, gl: &glow::Context) -> bool {
        self.frames_since_update += 1;

        let elapsed = self.last_update.elapsed().as_secs_f32();
        if elapsed < UPDATE_INTERVAL {
            return false;
        }

        self.fps = self.frames_since_update as f32 / elapsed;
        self.ram_mb = self.sample_ram_mb();
        self.gpu_percent = self.sample_gpu_percent(gl);
        self.temp_c = sample_cpu_temperature();

        self.last_update = Instant::now();
        self.frames_since_update = 0;
        true
    }

    /// Format the current metrics after a window-title base
    pub fn title_line(&self, base: &str) -> String {
        format!(
            "{} - {:.1} fps | RAM {} MB | GPU {}% | {} C",
            base, self.fps, self.ram_mb, self.gpu_percent, self.temp_c
        )
    }

    fn sample_ram_mb(&mut self) -> u64 {
        self.system.refresh_memory();
        let used = self.system.used_memory();
        used / (1024 * 1024)
    }

    fn sample_gpu_percent(&self, gl: &glow::Context) -> i32 {
        if !self.gpu_query_supported {
            return 0;
        }
        unsafe {
            let total_kb = gl.get_parameter_i32(GPU_MEMORY_INFO_TOTAL_AVAILABLE_MEMORY_NVX);
            let available_kb = gl.get_parameter_i32(GPU_MEMORY_INFO_CURRENT_AVAILABLE_VIDMEM_NVX);
            gpu_percent_from_kb(total_kb, available_kb)
        }
    }
}

/// GPU memory utilization from the NVX total/available counters
fn gpu_percent_from_kb(total_kb: i32, available_kb: i32) -> i32 {
    if total_kb <= 0 {
        return 0;
    }
    let used_kb = total_kb - available_kb;
    ((i64::from(used_kb) * 100) / i64::from(total_kb)) as i32
}

/// CPU temperature in whole degrees Celsius, or 0 when unavailable
#[cfg(target_os = "linux")]
fn sample_cpu_temperature() -> i32 {
    std::fs::read_to_string("/sys/class/thermal/thermal_zone0/temp")
        .ok()
        .and_then(|raw| millidegrees_to_celsius(&raw))
        .unwrap_or(0)
}

#[cfg(not(target_os = "linux"))]
fn sample_cpu_temperature() -> i32 {
    0
}

/// Parse a sysfs thermal reading (millidegrees) into degrees Celsius
fn millidegrees_to_celsius(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok().map(|milli| milli / 1000)
}
