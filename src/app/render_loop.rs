//! Render loop controller
//!
//! ```text
//! Uninitialized --attach--> Ready --start--> Running --shutdown--> Stopped
//! ```
//!
//! The controller owns the [`SceneBundle`] while attached and hands it back
//! on [`RenderLoopController::shutdown`]. Everything that mutates the scene,
//! the camera or the renderer goes through `&mut self`, so a resize or a
//! finished asset can never interleave with a render.

use std::time::Duration;

use crate::assets::pipeline::{AssetLoadPipeline, LoadTarget};
use crate::errors::{Error, LoopError, Result};
use crate::renderer::FrameStats;
use crate::resources::input::Input;
use crate::scene::SceneBundle;
use crate::utils::orbit_control::OrbitControls;

use super::behavior::Behavior;

/// Aspect difference tolerated before the camera is re-synced.
const ASPECT_EPSILON: f32 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    #[default]
    Uninitialized,
    Ready,
    Running,
    Stopped,
}

impl LoopState {
    /// Ready -> Running. Returns whether the state changed; already running
    /// loops stay running and the other states are left alone.
    pub fn request_start(&mut self) -> bool {
        if *self == Self::Ready {
            *self = Self::Running;
            return true;
        }
        false
    }

    #[must_use]
    pub fn is_running(self) -> bool {
        self == Self::Running
    }
}

/// What one tick did.
#[derive(Debug, Default)]
pub struct FrameReport {
    /// 1-based count of rendered ticks.
    pub frame: u64,
    pub dt: f32,
    /// Asset events applied at the start of the tick.
    pub assets_applied: usize,
    pub stats: FrameStats,
}

#[derive(Default)]
pub struct RenderLoopController {
    state: LoopState,
    bundle: Option<SceneBundle>,
    controls: Option<OrbitControls>,
    loader: Option<AssetLoadPipeline>,
    behaviors: Vec<Behavior>,
    input: Input,
    frames: u64,
}

impl RenderLoopController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the scene, camera, renderer and orbit controller. Uninitialized -> Ready.
    pub fn attach(&mut self, mut bundle: SceneBundle, controls: OrbitControls) -> Result<()> {
        if self.state != LoopState::Uninitialized {
            return Err(LoopError::AlreadyAttached.into());
        }

        if let Some(aspect) = bundle.renderer.aspect() {
            bundle.camera.set_aspect(aspect);
        }
        let (w, h) = bundle.renderer.size();
        self.input.inject_resize(w, h);

        self.bundle = Some(bundle);
        self.controls = Some(controls);
        self.state = LoopState::Ready;
        log::info!("Render loop ready ({w}x{h})");
        Ok(())
    }

    /// Hands the asset pipeline to the loop, which drains it every tick.
    pub fn attach_loader(&mut self, loader: AssetLoadPipeline) {
        if let Some(mut previous) = self.loader.replace(loader) {
            previous.cancel();
        }
    }

    pub fn add_behavior(&mut self, behavior: Behavior) {
        self.behaviors.push(behavior);
    }

    /// Ready -> Running. Idempotent while running.
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            LoopState::Uninitialized => Err(LoopError::NotAttached.into()),
            LoopState::Stopped => Err(LoopError::Stopped.into()),
            LoopState::Ready | LoopState::Running => {
                if self.state.request_start() {
                    log::info!("Render loop started");
                }
                Ok(())
            }
        }
    }

    // ========================================================================
    // Frame
    // ========================================================================

    /// Runs one frame: asset events, behaviors, orbit update, render.
    pub fn tick(&mut self, dt: f32) -> Result<FrameReport> {
        match self.state {
            LoopState::Uninitialized => return Err(LoopError::NotAttached.into()),
            LoopState::Ready => return Err(LoopError::NotRunning.into()),
            LoopState::Stopped => return Err(LoopError::Stopped.into()),
            LoopState::Running => {}
        }

        let assets_applied = self.pump_assets()?;

        let Some(bundle) = self.bundle.as_mut() else {
            return Err(LoopError::NotAttached.into());
        };

        for behavior in &self.behaviors {
            behavior.apply(&mut bundle.scene, dt);
        }

        if let Some(controls) = self.controls.as_mut() {
            controls.update(&mut bundle.camera, &self.input, dt);
        }

        // Never render with an aspect that disagrees with the output size
        if let Some(aspect) = bundle.renderer.aspect()
            && (bundle.camera.aspect() - aspect).abs() > ASPECT_EPSILON
        {
            log::debug!("Camera aspect {} out of sync, re-applying {aspect}", bundle.camera.aspect());
            bundle.camera.set_aspect(aspect);
        }

        let stats = bundle.renderer.render(&mut bundle.scene, &mut bundle.camera)?;
        for error in &stats.compile_errors {
            log::error!("{error}");
        }

        self.input.start_frame();
        self.frames += 1;

        Ok(FrameReport {
            frame: self.frames,
            dt,
            assets_applied,
            stats,
        })
    }

    /// Applies finished asset work. Usable before the loop runs; a mesh load
    /// that completes here is what moves the loop from Ready to Running.
    pub fn pump_assets(&mut self) -> Result<usize> {
        let (Some(loader), Some(bundle)) = (self.loader.as_mut(), self.bundle.as_mut()) else {
            return Ok(0);
        };
        let mut target = LoadTarget {
            scene: &mut bundle.scene,
            renderer: &mut bundle.renderer,
            loop_state: &mut self.state,
        };
        loader.poll(&mut target)
    }

    /// Blocks until the attached loader settles or `timeout` passes.
    pub fn wait_for_assets(&mut self, timeout: Duration) -> Result<bool> {
        let (Some(loader), Some(bundle)) = (self.loader.as_mut(), self.bundle.as_mut()) else {
            return Ok(true);
        };
        let mut target = LoadTarget {
            scene: &mut bundle.scene,
            renderer: &mut bundle.renderer,
            loop_state: &mut self.state,
        };
        loader.wait(&mut target, timeout)
    }

    // ========================================================================
    // Resize
    // ========================================================================

    /// Updates the renderer size and the camera aspect together. Zero sizes
    /// (minimised windows) and unchanged sizes are ignored. Returns whether
    /// anything changed.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        let Some(bundle) = self.bundle.as_mut() else {
            return false;
        };

        let aspect = width as f32 / height as f32;
        if bundle.renderer.size() == (width, height) && (bundle.camera.aspect() - aspect).abs() <= ASPECT_EPSILON {
            return false;
        }

        bundle.renderer.set_size(width, height);
        bundle.camera.set_aspect(aspect);
        self.input.inject_resize(width, height);
        true
    }

    /// Forwards a new device pixel ratio to the renderer. The logical size
    /// and the camera aspect do not change.
    pub fn set_pixel_ratio(&mut self, ratio: f32) -> bool {
        self.bundle
            .as_mut()
            .is_some_and(|bundle| bundle.renderer.set_pixel_ratio(ratio))
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Stops the loop, abandons in-flight loads and returns the bundle.
    pub fn shutdown(&mut self) -> Option<SceneBundle> {
        if let Some(loader) = self.loader.as_mut() {
            loader.cancel();
        }
        if self.state != LoopState::Stopped {
            log::info!("Render loop stopped after {} frame(s)", self.frames);
        }
        self.state = LoopState::Stopped;
        self.controls = None;
        self.behaviors.clear();
        self.bundle.take()
    }

    // ========================================================================
    // Access
    // ========================================================================

    #[must_use]
    pub fn state(&self) -> LoopState {
        self.state
    }

    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    #[must_use]
    pub fn bundle(&self) -> Option<&SceneBundle> {
        self.bundle.as_ref()
    }

    pub fn bundle_mut(&mut self) -> Option<&mut SceneBundle> {
        self.bundle.as_mut()
    }

    /// The bundle, or [`LoopError::NotAttached`].
    pub fn try_bundle_mut(&mut self) -> Result<&mut SceneBundle> {
        self.bundle.as_mut().ok_or(Error::Loop(LoopError::NotAttached))
    }

    #[must_use]
    pub fn controls(&self) -> Option<&OrbitControls> {
        self.controls.as_ref()
    }

    pub fn controls_mut(&mut self) -> Option<&mut OrbitControls> {
        self.controls.as_mut()
    }

    #[must_use]
    pub fn loader(&self) -> Option<&AssetLoadPipeline> {
        self.loader.as_ref()
    }

    pub fn loader_mut(&mut self) -> Option<&mut AssetLoadPipeline> {
        self.loader.as_mut()
    }

    #[must_use]
    pub fn behaviors(&self) -> &[Behavior] {
        &self.behaviors
    }

    #[must_use]
    pub fn input(&self) -> &Input {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut Input {
        &mut self.input
    }
}
