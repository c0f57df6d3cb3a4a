//! Two-stage asset pipeline
//!
//! Loads a mesh first and, once the mesh is in the scene and the loop has
//! been asked to start, an environment map.
//!
//! ```text
//! Idle -> LoadingMesh -> MeshReady -> LoadingEnvironment -> Complete
//!              |                              |
//!              +-> Failed(Mesh)               +-> Failed(Environment)
//! ```
//!
//! Fetching and decoding run on a process-wide tokio runtime. Results come
//! back over a channel and are applied only in [`AssetLoadPipeline::poll`],
//! which the render loop calls on its own thread. Every `load` or `cancel`
//! bumps a generation counter; events from older generations are dropped.

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use glam::Vec3;
use parking_lot::Mutex;
use tokio::runtime::Runtime;

use super::cancel::CancelToken;
use super::codec::{EnvironmentCodec, EquirectCodec, GltfCodec, ModelCodec};
use super::io::AssetReaderVariant;
use super::model::ModelAsset;
use super::progress::{LoadProgress, ProgressTracker};
use crate::app::render_loop::LoopState;
use crate::errors::{Error, LoadError, LoadStage, Result};
use crate::renderer::Renderer;
use crate::resources::texture::EnvironmentMap;
use crate::scene::{Background, NodeKey, Scene};

fn asset_runtime() -> std::result::Result<&'static Runtime, String> {
    static RUNTIME: OnceLock<std::io::Result<Runtime>> = OnceLock::new();
    RUNTIME
        .get_or_init(|| {
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .thread_name("showroom-assets")
                .enable_all()
                .build()
        })
        .as_ref()
        .map_err(|e| format!("asset runtime unavailable: {e}"))
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct MeshRequest {
    pub path: String,
    /// Uniform scale of the model's root node.
    pub scale: Vec3,
    /// Rotation of the model's root node around Y, in radians.
    pub rotation_y: f32,
    pub cast_shadows: bool,
    pub receive_shadows: bool,
}

impl MeshRequest {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            scale: Vec3::splat(2.0),
            rotation_y: std::f32::consts::PI,
            cast_shadows: true,
            receive_shadows: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentRequest {
    pub path: String,
    pub intensity: f32,
    /// Also show the map as the scene background.
    pub as_background: bool,
}

impl EnvironmentRequest {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            intensity: 0.5,
            as_background: true,
        }
    }
}

// ============================================================================
// State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    LoadingMesh,
    MeshReady,
    LoadingEnvironment,
    Complete,
    Failed(LoadStage),
}

impl LoadState {
    /// No stage is in flight.
    #[must_use]
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Idle | Self::Complete | Self::Failed(_))
    }

    fn active_stage(self) -> Option<LoadStage> {
        match self {
            Self::LoadingMesh => Some(LoadStage::Mesh),
            Self::LoadingEnvironment => Some(LoadStage::Environment),
            _ => None,
        }
    }
}

/// Ordered record of what the pipeline did during the current load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    MeshRequested,
    MeshAttached,
    StartRequested,
    EnvironmentRequested,
    EnvironmentApplied,
    Failed(LoadStage),
    Cancelled,
}

enum LoadEvent {
    Progress {
        generation: u64,
        stage: LoadStage,
        progress: LoadProgress,
    },
    Mesh {
        generation: u64,
        model: ModelAsset,
    },
    Environment {
        generation: u64,
        map: EnvironmentMap,
    },
    Failed {
        generation: u64,
        error: LoadError,
    },
}

impl LoadEvent {
    fn generation(&self) -> u64 {
        match self {
            Self::Progress { generation, .. }
            | Self::Mesh { generation, .. }
            | Self::Environment { generation, .. }
            | Self::Failed { generation, .. } => *generation,
        }
    }
}

/// What `poll` mutates when it applies finished stages.
pub struct LoadTarget<'a> {
    pub scene: &'a mut Scene,
    pub renderer: &'a mut Renderer,
    pub loop_state: &'a mut LoopState,
}

pub type ProgressCallback = Box<dyn FnMut(LoadStage, LoadProgress) + Send>;

// ============================================================================
// Pipeline
// ============================================================================

pub struct AssetLoadPipeline {
    reader: AssetReaderVariant,
    model_codec: Arc<dyn ModelCodec>,
    environment_codec: Arc<dyn EnvironmentCodec>,

    state: LoadState,
    generation: u64,
    tx: flume::Sender<LoadEvent>,
    rx: flume::Receiver<LoadEvent>,

    mesh_request: Option<MeshRequest>,
    environment_request: Option<EnvironmentRequest>,
    mesh_cancel: Option<CancelToken>,
    environment_cancel: Option<CancelToken>,

    progress: Option<LoadProgress>,
    on_progress: Option<ProgressCallback>,
    model_root: Option<NodeKey>,
    errors: Vec<LoadError>,
    history: Vec<Milestone>,
}

impl AssetLoadPipeline {
    /// A pipeline with the glTF and equirectangular codecs.
    #[must_use]
    pub fn new(reader: AssetReaderVariant) -> Self {
        Self::with_codecs(reader, Arc::new(GltfCodec), Arc::new(EquirectCodec))
    }

    #[must_use]
    pub fn with_codecs(
        reader: AssetReaderVariant,
        model_codec: Arc<dyn ModelCodec>,
        environment_codec: Arc<dyn EnvironmentCodec>,
    ) -> Self {
        let (tx, rx) = flume::unbounded();
        Self {
            reader,
            model_codec,
            environment_codec,
            state: LoadState::Idle,
            generation: 0,
            tx,
            rx,
            mesh_request: None,
            environment_request: None,
            mesh_cancel: None,
            environment_cancel: None,
            progress: None,
            on_progress: None,
            model_root: None,
            errors: Vec::new(),
            history: Vec::new(),
        }
    }

    /// Called on the loop thread for every new progress value.
    pub fn on_progress(&mut self, callback: impl FnMut(LoadStage, LoadProgress) + Send + 'static) {
        self.on_progress = Some(Box::new(callback));
    }

    #[must_use]
    pub fn state(&self) -> LoadState {
        self.state
    }

    /// Progress of the stage currently loading; `None` before its first chunk.
    #[must_use]
    pub fn progress(&self) -> Option<LoadProgress> {
        self.progress
    }

    /// Scene node holding the loaded model.
    #[must_use]
    pub fn model_root(&self) -> Option<NodeKey> {
        self.model_root
    }

    /// Every failure recorded during the current load.
    #[must_use]
    pub fn errors(&self) -> &[LoadError] {
        &self.errors
    }

    #[must_use]
    pub fn history(&self) -> &[Milestone] {
        &self.history
    }

    // ========================================================================
    // Control
    // ========================================================================

    /// Starts a new load, abandoning any load in flight. The environment
    /// stage is only requested after the mesh has been attached.
    pub fn load(&mut self, mesh: MeshRequest, environment: Option<EnvironmentRequest>) {
        self.cancel_tokens();
        self.generation += 1;
        self.errors.clear();
        self.history.clear();
        self.progress = None;
        self.model_root = None;

        log::info!("Loading mesh '{}'", mesh.path);
        let path = mesh.path.clone();
        self.mesh_request = Some(mesh);
        self.environment_request = environment;

        let codec = self.model_codec.clone();
        let name = AssetReaderVariant::source_filename(&path).to_string();
        self.mesh_cancel = Some(self.spawn_fetch(LoadStage::Mesh, path, move |bytes, generation| {
            codec
                .decode(&bytes, &name)
                .map(|model| LoadEvent::Mesh { generation, model })
        }));
        self.state = LoadState::LoadingMesh;
        self.history.push(Milestone::MeshRequested);
    }

    /// Abandons the current load. Late results are discarded.
    pub fn cancel(&mut self) {
        if self.state.is_settled() {
            return;
        }
        log::info!("Asset load cancelled in state {:?}", self.state);
        self.cancel_tokens();
        self.generation += 1;
        self.state = LoadState::Idle;
        self.progress = None;
        self.history.push(Milestone::Cancelled);
    }

    fn cancel_tokens(&mut self) {
        for token in [self.mesh_cancel.take(), self.environment_cancel.take()]
            .into_iter()
            .flatten()
        {
            token.cancel();
        }
    }

    fn spawn_fetch<F>(&self, stage: LoadStage, path: String, decode: F) -> CancelToken
    where
        F: FnOnce(Vec<u8>, u64) -> std::result::Result<LoadEvent, String> + Send + 'static,
    {
        let token = CancelToken::new();
        let generation = self.generation;
        let tx = self.tx.clone();

        let runtime = match asset_runtime() {
            Ok(runtime) => runtime,
            Err(cause) => {
                let _ = tx.send(LoadEvent::Failed {
                    generation,
                    error: LoadError::Fetch { stage, path, cause },
                });
                return token;
            }
        };

        let reader = self.reader.clone();
        let cancel = token.clone();
        runtime.spawn(async move {
            let tracker = Mutex::new(ProgressTracker::new());
            let progress_tx = tx.clone();
            let progress_cancel = cancel.clone();
            let on_chunk = move |loaded: u64, total: Option<u64>| {
                if progress_cancel.is_cancelled() {
                    return;
                }
                if let Some(progress) = tracker.lock().update(loaded, total) {
                    let _ = progress_tx.send(LoadEvent::Progress {
                        generation,
                        stage,
                        progress,
                    });
                }
            };

            let bytes = match reader.read_bytes(&path, &on_chunk).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    let _ = tx.send(LoadEvent::Failed {
                        generation,
                        error: LoadError::Fetch {
                            stage,
                            path,
                            cause: e.to_string(),
                        },
                    });
                    return;
                }
            };
            if cancel.is_cancelled() {
                log::debug!("{stage} fetch of '{path}' finished after cancellation");
                return;
            }

            let event = match tokio::task::spawn_blocking(move || decode(bytes, generation)).await {
                Ok(Ok(event)) => event,
                Ok(Err(cause)) => LoadEvent::Failed {
                    generation,
                    error: LoadError::Decode { stage, path, cause },
                },
                Err(join) => LoadEvent::Failed {
                    generation,
                    error: LoadError::Decode {
                        stage,
                        path,
                        cause: join.to_string(),
                    },
                },
            };
            if !cancel.is_cancelled() {
                let _ = tx.send(event);
            }
        });

        token
    }

    // ========================================================================
    // Applying results (loop thread)
    // ========================================================================

    /// Applies every result that has arrived. Returns the number of events
    /// applied.
    ///
    /// A mesh-stage failure is returned as an error and leaves the loop state
    /// untouched. Environment-stage failures are only logged and recorded.
    pub fn poll(&mut self, target: &mut LoadTarget<'_>) -> Result<usize> {
        let mut applied = 0;
        while let Ok(event) = self.rx.try_recv() {
            if self.handle(event, target)? {
                applied += 1;
            }
        }
        Ok(applied)
    }

    /// Blocks until the current load settles or `timeout` elapses. Returns
    /// whether it settled.
    pub fn wait(&mut self, target: &mut LoadTarget<'_>, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        while !self.state.is_settled() {
            match self.rx.recv_deadline(deadline) {
                Ok(event) => {
                    self.handle(event, target)?;
                }
                Err(_) => return Ok(false),
            }
        }
        self.poll(target)?;
        Ok(true)
    }

    fn handle(&mut self, event: LoadEvent, target: &mut LoadTarget<'_>) -> Result<bool> {
        if event.generation() != self.generation {
            log::debug!("Dropping asset event from stale load {}", event.generation());
            return Ok(false);
        }

        match event {
            LoadEvent::Progress { stage, progress, .. } => {
                if self.state.active_stage() != Some(stage) {
                    return Ok(false);
                }
                self.progress = Some(progress);
                if let Some(callback) = self.on_progress.as_mut() {
                    callback(stage, progress);
                }
            }
            LoadEvent::Mesh { model, .. } => {
                if self.state != LoadState::LoadingMesh {
                    return Ok(false);
                }
                self.attach_mesh(model, target);
            }
            LoadEvent::Environment { map, .. } => {
                if self.state != LoadState::LoadingEnvironment {
                    return Ok(false);
                }
                self.apply_environment(map, target);
            }
            LoadEvent::Failed { error, .. } => {
                let stage = error.stage();
                if self.state.active_stage() != Some(stage) {
                    return Ok(false);
                }
                self.state = LoadState::Failed(stage);
                self.history.push(Milestone::Failed(stage));
                self.mesh_cancel = None;
                self.environment_cancel = None;
                self.errors.push(error.clone());

                match stage {
                    LoadStage::Mesh => {
                        log::error!("{error}");
                        return Err(Error::Load(error));
                    }
                    LoadStage::Environment => {
                        log::warn!("{error}; continuing without environment");
                    }
                }
            }
        }
        Ok(true)
    }

    fn attach_mesh(&mut self, mut model: ModelAsset, target: &mut LoadTarget<'_>) {
        self.mesh_cancel = None;
        if let Some(request) = &self.mesh_request {
            model.root.scale = request.scale;
            model.root.set_rotation_euler(0.0, request.rotation_y, 0.0);
            model.set_shadows(request.cast_shadows, request.receive_shadows);
        }

        for error in target.renderer.prewarm(model.meshes_mut().map(|m| &mut m.material)) {
            log::error!("Pre-warm of loaded model failed: {error}");
        }

        let root = target.scene.instantiate(model);
        self.model_root = Some(root);
        self.state = LoadState::MeshReady;
        self.history.push(Milestone::MeshAttached);

        target.loop_state.request_start();
        self.history.push(Milestone::StartRequested);
        log::info!("Mesh attached, render loop {:?}", target.loop_state);

        // The environment stage is scheduled from here, never earlier
        match self.environment_request.clone() {
            Some(request) => {
                log::info!("Loading environment '{}'", request.path);
                self.progress = None;
                let codec = self.environment_codec.clone();
                let name = AssetReaderVariant::source_filename(&request.path).to_string();
                self.environment_cancel = Some(self.spawn_fetch(
                    LoadStage::Environment,
                    request.path,
                    move |bytes, generation| {
                        codec
                            .decode(&bytes, &name)
                            .map(|map| LoadEvent::Environment { generation, map })
                    },
                ));
                self.state = LoadState::LoadingEnvironment;
                self.history.push(Milestone::EnvironmentRequested);
            }
            None => self.state = LoadState::Complete,
        }
    }

    fn apply_environment(&mut self, map: EnvironmentMap, target: &mut LoadTarget<'_>) {
        self.environment_cancel = None;
        let (intensity, as_background) = self
            .environment_request
            .as_ref()
            .map_or((0.5, true), |r| (r.intensity, r.as_background));

        let map = Arc::new(map);
        target.scene.environment.set_map(map.clone(), intensity);
        if as_background {
            target.scene.background = Some(Background::Texture(map));
        }
        target.loop_state.request_start();

        self.state = LoadState::Complete;
        self.history.push(Milestone::EnvironmentApplied);
        log::info!("Environment applied");
    }
}

impl Drop for AssetLoadPipeline {
    fn drop(&mut self) {
        self.cancel_tokens();
    }
}
