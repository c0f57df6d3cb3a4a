//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`Error`] covers all failure modes including:
//! - GPU initialization failures
//! - Asset fetching and decoding errors ([`LoadError`])
//! - Shader patching and compilation errors ([`PatchError`])
//! - Render loop lifecycle misuse ([`LoopError`])
//!
//! All public APIs return [`Result<T>`] which is an alias for `std::result::Result<T, Error>`.
//!
//! ```rust,ignore
//! use showroom::errors::{Error, Result};
//!
//! fn start(controller: &mut RenderLoopController) -> Result<()> {
//!     controller.start()?;
//!     Ok(())
//! }
//! ```

use std::fmt;

use thiserror::Error;

use crate::renderer::injection::ShaderStage;
use crate::resources::material::MaterialId;

/// Which stage of the two-stage asset pipeline an event or error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadStage {
    Mesh,
    Environment,
}

impl fmt::Display for LoadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mesh => f.write_str("mesh"),
            Self::Environment => f.write_str("environment"),
        }
    }
}

/// A failed asset stage. Never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The bytes could not be fetched (missing file, network error, ...).
    #[error("failed to fetch {stage} asset '{path}': {cause}")]
    Fetch {
        stage: LoadStage,
        path: String,
        cause: String,
    },

    /// The bytes arrived but could not be decoded into a model or texture.
    #[error("failed to decode {stage} asset '{path}': {cause}")]
    Decode {
        stage: LoadStage,
        path: String,
        cause: String,
    },
}

impl LoadError {
    #[must_use]
    pub fn stage(&self) -> LoadStage {
        match self {
            Self::Fetch { stage, .. } | Self::Decode { stage, .. } => *stage,
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Fetch { path, .. } | Self::Decode { path, .. } => path,
        }
    }
}

/// Errors produced while rewriting shader source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    /// The anchor line the patch wants to insert after is not in the source.
    #[error("anchor '{anchor}' not found in {stage} shader")]
    AnchorNotFound {
        anchor: &'static str,
        stage: ShaderStage,
    },

    /// Two uniforms with the same name were registered by one patch.
    #[error("uniform '{0}' declared twice")]
    DuplicateUniform(String),

    /// Uniform names end up as WGSL struct members.
    #[error("'{0}' is not a valid uniform identifier")]
    InvalidUniformName(String),
}

/// Misuse of the render loop lifecycle.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopError {
    #[error("render loop has no scene bundle attached")]
    NotAttached,

    #[error("render loop already has a scene bundle attached")]
    AlreadyAttached,

    #[error("render loop is not running")]
    NotRunning,

    #[error("render loop has been stopped")]
    Stopped,
}

/// The main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // GPU & Rendering Errors
    // ========================================================================
    /// Failed to request a compatible GPU adapter.
    #[error("Failed to request WGPU adapter: {0}")]
    AdapterRequestFailed(String),

    /// Failed to create the GPU device.
    #[error("Failed to create WGPU device: {0}")]
    DeviceCreateFailed(#[from] wgpu::RequestDeviceError),

    /// Failed to create the presentation surface.
    #[error("Failed to create surface: {0}")]
    SurfaceCreateFailed(#[from] wgpu::CreateSurfaceError),

    /// Any other backend failure (lost surface, pipeline creation, ...).
    #[error("GPU error: {0}")]
    Gpu(String),

    /// Event loop error (winit).
    #[cfg(feature = "winit")]
    #[error("Event loop error: {0}")]
    EventLoopError(#[from] winit::error::EventLoopError),

    // ========================================================================
    // Shader Errors
    // ========================================================================
    /// A material's program failed to build. The mesh is drawn with the
    /// fallback program instead.
    #[error("Shader compile error for {material_id}: {cause}")]
    ShaderCompile {
        material_id: MaterialId,
        cause: String,
    },

    /// A shader patch could not be applied.
    #[error("Shader patch error: {0}")]
    Patch(#[from] PatchError),

    /// Template rendering failed.
    #[error("Shader template error: {0}")]
    Template(#[from] minijinja::Error),

    // ========================================================================
    // Asset Loading Errors
    // ========================================================================
    #[error(transparent)]
    Load(#[from] LoadError),

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    #[error(transparent)]
    Loop(#[from] LoopError),

    // ========================================================================
    // I/O & Format Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error (configuration files).
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
