//! Real-time black-hole rendering demo
//!
//! Drives the engine's render graph at a fixed 1920x1080: a procedural
//! black-hole scene composited through brightness extraction, an
//! eight-level bloom pyramid, tonemapping, and a present pass, with
//! keyboard-tunable parameters and a telemetry overlay in the window title.

mod controls;
mod stats;
mod worker;

use render_engine::prelude::*;

const SCR_WIDTH: u32 = 1920;
const SCR_HEIGHT: u32 = 1080;
const WINDOW_TITLE: &str = "Blackhole";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Starting black-hole renderer");

    let mut window = GlWindow::new(WINDOW_TITLE, SCR_WIDTH, SCR_HEIGHT)?;
    let mut cache = RenderResourceCache::new();
    let quad = FullscreenQuad::new(window.gl())?;
    let mut graph = RenderGraph::new(SCR_WIDTH as i32, SCR_HEIGHT as i32);

    // Content textures; missing files warn and fall back to black
    // placeholders so the demo runs without assets
    let galaxy = load_cubemap(window.gl(), "assets/skybox_nebula_dark")?;
    let color_map = load_texture_2d(window.gl(), "assets/color_map.png", false)?;
    let scene = SceneInputs { color_map, galaxy };

    let mut stats = stats::StatsOverlay::new(window.gl());
    let mut controls = controls::Controls::default();
    let mut sim_worker = worker::SimulationWorker::spawn();
    let mut mouse = (0.0f32, 0.0f32);

    log::info!("Entering main loop");

    while !window.should_close() {
        window.poll_events();
        let events: Vec<glfw::WindowEvent> = window.flush_events().map(|(_, e)| e).collect();
        for event in events {
            match event {
                glfw::WindowEvent::CursorPos(x, y) => {
                    mouse = (x as f32, y as f32);
                }
                glfw::WindowEvent::Key(glfw::Key::Escape, _, glfw::Action::Press, _) => {
                    window.set_should_close(true);
                }
                glfw::WindowEvent::Key(key, _, glfw::Action::Press | glfw::Action::Repeat, _) => {
                    controls.handle_key(key);
                }
                _ => {}
            }
        }

        let settings = controls.frame_settings(mouse.0, mouse.1);
        let time = window.time();
        graph.render_frame(window.gl(), &mut cache, &quad, time, &settings, &scene)?;

        if stats.frame_tick(window.gl()) {
            window.set_title(&stats.title_line(WINDOW_TITLE));
            log::debug!("simulation phase {:.2}", sim_worker.phase());
        }

        // Vsync paces the loop; no explicit GPU fence is needed
        window.swap_buffers();
    }

    sim_worker.stop();
    log::info!("Shutdown complete");
    Ok(())
}
