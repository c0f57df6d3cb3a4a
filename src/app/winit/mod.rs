//! Winit-based window runner
//!
//! - [`App`]: builder for the window and renderer settings
//! - [`AppHandler`]: implemented by each demo to build and drive its scene
//! - `AppRunner`: the winit `ApplicationHandler` (not exposed)
//!
//! The runner owns a [`RenderLoopController`]. It forwards input and resize
//! events to it and, on every redraw, either ticks the loop (when running)
//! or only drains asset events (while a loader scene waits for its model).
//!
//! ```rust,ignore
//! struct Basic;
//!
//! impl AppHandler for Basic {
//!     fn init(controller: &mut RenderLoopController, backend: Box<dyn RenderBackend>, window: &WindowInfo) -> Result<Self> {
//!         let config = SceneConfig::basic().with_viewport(window.logical_size.0, window.logical_size.1);
//!         let bundle = SceneGraphBuilder::new(config.clone()).build(backend)?;
//!         Showcase::Basic.attach(controller, bundle, &config)?;
//!         Ok(Self)
//!     }
//! }
//!
//! fn main() -> showroom::errors::Result<()> {
//!     App::new().with_title("Basic").run::<Basic>()
//! }
//! ```

use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
pub use winit::window::{Window, WindowId};

use crate::app::render_loop::{FrameReport, RenderLoopController};
use crate::errors::{Error, Result};
use crate::renderer::backend::RenderBackend;
use crate::renderer::gpu::WgpuBackend;
use crate::renderer::settings::RendererSettings;
use crate::utils::time::Timer;

pub mod input_adapter;

/// Window metrics handed to [`AppHandler::init`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowInfo {
    pub logical_size: (u32, u32),
    pub scale_factor: f32,
}

/// Per-demo behavior.
pub trait AppHandler: Sized + 'static {
    /// Builds the scene around `backend` and attaches it to `controller`.
    fn init(controller: &mut RenderLoopController, backend: Box<dyn RenderBackend>, window: &WindowInfo) -> Result<Self>;

    /// Sees every window event first. Return `true` to consume it.
    #[allow(unused_variables)]
    fn on_event(&mut self, controller: &mut RenderLoopController, event: &WindowEvent) -> bool {
        false
    }

    /// Called after every rendered tick.
    #[allow(unused_variables)]
    fn update(&mut self, controller: &mut RenderLoopController, report: &FrameReport) {}
}

pub struct App {
    title: String,
    settings: RendererSettings,
    size: (f64, f64),
}

impl App {
    #[must_use]
    pub fn new() -> Self {
        Self {
            title: "Showroom".into(),
            settings: RendererSettings::default(),
            size: (1280.0, 720.0),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Backend settings. The pixel ratio is taken from the window.
    #[must_use]
    pub fn with_settings(mut self, settings: RendererSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Initial logical window size.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (f64::from(width), f64::from(height));
        self
    }

    /// Runs the event loop on the current thread until the window closes.
    pub fn run<H: AppHandler>(self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut runner = AppRunner::<H>::new(self);
        event_loop.run_app(&mut runner)?;
        runner.failure.map_or(Ok(()), Err)
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

struct AppRunner<H: AppHandler> {
    app: App,
    window: Option<Arc<Window>>,
    controller: RenderLoopController,
    handler: Option<H>,
    timer: Timer,
    /// Fatal error that ended the event loop.
    failure: Option<Error>,
}

impl<H: AppHandler> AppRunner<H> {
    fn new(app: App) -> Self {
        Self {
            app,
            window: None,
            controller: RenderLoopController::new(),
            handler: None,
            timer: Timer::new(),
            failure: None,
        }
    }

    fn init(&mut self, window: &Arc<Window>) -> Result<H> {
        let scale_factor = window.scale_factor();
        let physical = window.inner_size();
        let logical = physical.to_logical::<u32>(scale_factor);

        let mut settings = self.app.settings.clone();
        settings.pixel_ratio = scale_factor as f32;

        log::info!("Initializing wgpu backend ({}x{} px)", physical.width, physical.height);
        let backend = pollster::block_on(WgpuBackend::new(window.clone(), physical.width.max(1), physical.height.max(1), &settings))?;

        let info = WindowInfo {
            logical_size: (logical.width.max(1), logical.height.max(1)),
            scale_factor: scale_factor as f32,
        };
        H::init(&mut self.controller, Box::new(backend), &info)
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: Error) {
        log::error!("Fatal: {error}");
        self.controller.shutdown();
        self.failure = Some(error);
        event_loop.exit();
    }

    fn redraw(&mut self) {
        let (Some(window), Some(handler)) = (&self.window, &mut self.handler) else {
            return;
        };

        if let Some(fps) = self.timer.tick() {
            window.set_title(&format!("{} - {fps:.0} fps", self.app.title));
        }
        let dt = self.timer.dt_seconds();

        if self.controller.state().is_running() {
            match self.controller.tick(dt) {
                Ok(report) => handler.update(&mut self.controller, &report),
                Err(e) => log::error!("Frame failed: {e}"),
            }
        } else if let Err(e) = self.controller.pump_assets() {
            log::error!("{e}");
        }
    }
}

impl<H: AppHandler> ApplicationHandler for AppRunner<H> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title(&self.app.title)
            .with_inner_size(winit::dpi::LogicalSize::new(self.app.size.0, self.app.size.1));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.fail(event_loop, Error::Gpu(format!("window creation failed: {e}")));
                return;
            }
        };
        self.window = Some(window.clone());

        match self.init(&window) {
            Ok(handler) => {
                self.handler = Some(handler);
                self.timer = Timer::new();
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.clone() else {
            return;
        };
        let Some(handler) = self.handler.as_mut() else {
            return;
        };

        if !handler.on_event(&mut self.controller, &event) {
            input_adapter::process_window_event(self.controller.input_mut(), &event, window.scale_factor());
        }

        match event {
            WindowEvent::CloseRequested => {
                self.controller.shutdown();
                event_loop.exit();
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.controller.set_pixel_ratio(scale_factor as f32);
            }
            WindowEvent::Resized(physical_size) => {
                let scale_factor = window.scale_factor();
                self.controller.set_pixel_ratio(scale_factor as f32);
                let logical = physical_size.to_logical::<u32>(scale_factor);
                self.controller.resize(logical.width, logical.height);
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
                window.request_redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if self.handler.is_some()
            && let Some(window) = &self.window
        {
            window.request_redraw();
        }
    }
}
