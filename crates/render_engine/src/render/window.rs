//! Window management using GLFW
//!
//! Provides window creation, OpenGL 3.3 core context setup, and event
//! handling. The returned [`GlWindow`] owns the loaded [`glow::Context`];
//! every GL call in the engine goes through a reference borrowed from it.

use thiserror::Error;

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// GLFW library initialization failed
    #[error("GLFW initialization failed")]
    InitializationFailed,

    /// Window or GL context creation failed
    #[error("Window creation failed")]
    CreationFailed,
}

/// Result type for window operations
pub type WindowResult<T> = Result<T, WindowError>;

/// GLFW window wrapper owning the GL context
///
/// The window is created undecorated at the top-left corner of the screen
/// with vsync enabled; size and title are fixed for the window's lifetime.
pub struct GlWindow {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
    gl: glow::Context,
}

impl GlWindow {
    /// Create a window with an OpenGL 3.3 core profile context
    ///
    /// Loads the GL function pointers through GLFW's loader and leaves the
    /// context current on the calling thread. Fails if GLFW cannot be
    /// initialized or the platform refuses the context version.
    pub fn new(title: &str, width: u32, height: u32) -> WindowResult<Self> {
        use glfw::Context;

        let mut glfw = glfw::init(glfw::fail_on_errors)
            .map_err(|_| WindowError::InitializationFailed)?;

        glfw.window_hint(glfw::WindowHint::ContextVersion(3, 3));
        glfw.window_hint(glfw::WindowHint::OpenGlProfile(
            glfw::OpenGlProfileHint::Core,
        ));
        #[cfg(target_os = "macos")]
        glfw.window_hint(glfw::WindowHint::OpenGlForwardCompat(true));
        glfw.window_hint(glfw::WindowHint::Decorated(false));
        glfw.window_hint(glfw::WindowHint::Resizable(false));

        let (mut window, events) = glfw
            .create_window(width, height, title, glfw::WindowMode::Windowed)
            .ok_or(WindowError::CreationFailed)?;

        window.set_pos(0, 0);
        window.make_current();
        glfw.set_swap_interval(glfw::SwapInterval::Sync(1));

        // Set up event polling
        window.set_key_polling(true);
        window.set_close_polling(true);
        window.set_cursor_pos_polling(true);
        window.set_framebuffer_size_polling(true);

        let gl = unsafe {
            glow::Context::from_loader_function(|name| window.get_proc_address(name) as *const _)
        };

        log::info!("Created {}x{} window with GL 3.3 core context", width, height);

        Ok(Self {
            glfw,
            window,
            events,
            gl,
        })
    }

    /// The loaded GL context
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    /// Whether the user has requested the window to close
    pub fn should_close(&self) -> bool {
        self.window.should_close()
    }

    /// Request the window to close
    pub fn set_should_close(&mut self, should_close: bool) {
        self.window.set_should_close(should_close);
    }

    /// Poll the platform for pending events
    pub fn poll_events(&mut self) {
        self.glfw.poll_events();
    }

    /// Drain events gathered since the last poll
    pub fn flush_events(&self) -> glfw::FlushedMessages<'_, (f64, glfw::WindowEvent)> {
        glfw::flush_messages(&self.events)
    }

    /// Monotonic seconds since GLFW initialization
    pub fn time(&self) -> f32 {
        self.glfw.get_time() as f32
    }

    /// Current framebuffer size in pixels
    pub fn framebuffer_size(&self) -> (i32, i32) {
        self.window.get_framebuffer_size()
    }

    /// Replace the window title (used by the telemetry overlay)
    pub fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }

    /// Present the back buffer; blocks on vsync, pacing the frame loop
    pub fn swap_buffers(&mut self) {
        use glfw::Context;
        self.window.swap_buffers();
    }
}
