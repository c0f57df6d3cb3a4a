//! # Showroom
//!
//! Real-time 3D showcase scenes on top of wgpu.
//!
//! - [`scene`]: scene graph, camera, lights and the [`SceneGraphBuilder`]
//! - [`app`]: the [`RenderLoopController`] and per-tick behaviors
//! - [`assets`]: the two-stage mesh/environment [`AssetLoadPipeline`]
//! - [`renderer`]: lazy program compilation, shader injection and backends
//! - [`utils`]: orbit controls, timing and logging setup
//!
//! ```rust,ignore
//! use showroom::prelude::*;
//!
//! let config = SceneConfig::basic().with_viewport(1280, 720);
//! let (bundle, _log) = SceneGraphBuilder::new(config.clone()).build_headless()?;
//! let mut controller = RenderLoopController::new();
//! Showcase::Basic.attach(&mut controller, bundle, &config)?;
//! controller.tick(1.0 / 60.0)?;
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod app;
pub mod assets;
pub mod errors;
pub mod renderer;
pub mod resources;
pub mod scene;
pub mod utils;

pub use app::{Behavior, LoopState, RenderLoopController};
pub use assets::AssetLoadPipeline;
pub use errors::{Error, Result};
pub use renderer::Renderer;
pub use scene::{SceneBundle, SceneConfig, SceneGraphBuilder};
pub use utils::orbit_control::OrbitControls;

pub mod prelude {
    pub use crate::app::{Behavior, FrameReport, LoopState, Rate, RenderLoopController};
    #[cfg(feature = "winit")]
    pub use crate::app::winit::{App, AppHandler, WindowInfo};
    pub use crate::assets::{
        AssetLoadPipeline, AssetReaderVariant, EnvironmentRequest, LoadProgress, LoadState, MemoryAssetReader,
        MeshRequest,
    };
    pub use crate::errors::{Error, LoadError, LoadStage, Result};
    pub use crate::renderer::{
        Anchor, AnchorPatch, FrameLog, PatchedShader, RenderBackend, Renderer, RendererSettings, ShaderPatch,
        ShaderSource, ShadowMapType, ensure_area_light_support,
    };
    pub use crate::resources::primitives::*;
    pub use crate::resources::{Geometry, Material, Mesh, ShaderMaterial, StandardMaterial, UniformSet, UniformValue};
    pub use crate::scene::showcase::Showcase;
    pub use crate::scene::{
        Background, Camera, GroundPlane, Light, LightingRig, Node, NodeKey, Scene, SceneBundle, SceneConfig,
        SceneGraphBuilder, Transform,
    };
    pub use crate::utils::{OrbitControls, init_logging};
    pub use glam::{Vec2, Vec3, Vec4};
}
