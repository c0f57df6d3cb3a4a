//! Headless Backend
//!
//! Records every frame packet in a bounded in-memory log instead of drawing.
//! The log handle is cloneable, so a test keeps one while the renderer owns
//! the backend.

use std::collections::VecDeque;
use std::sync::Arc;

use glam::{Mat4, Vec4};
use parking_lot::Mutex;

use super::backend::{FramePacket, RenderBackend};
use super::program::{ProgramDesc, ProgramId};
use crate::errors::Result;
use crate::resources::material::MaterialId;
use crate::resources::uniforms::UniformSet;
use crate::scene::NodeKey;

const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct DrawRecord {
    pub node: NodeKey,
    pub material: MaterialId,
    pub program: ProgramId,
    pub fallback: bool,
    pub model: Mat4,
    pub uniforms: UniformSet,
}

#[derive(Debug, Clone)]
pub struct FrameRecord {
    pub frame_index: u64,
    pub size: (u32, u32),
    pub clear_color: Vec4,
    pub light_count: usize,
    pub has_shadow_pass: bool,
    /// Id of the environment map drawn as background.
    pub background: Option<u64>,
    pub draws: Vec<DrawRecord>,
}

impl FrameRecord {
    /// Draw of the mesh on `node`, if any.
    #[must_use]
    pub fn draw_for(&self, node: NodeKey) -> Option<&DrawRecord> {
        self.draws.iter().find(|d| d.node == node)
    }
}

#[derive(Debug, Default)]
struct LogInner {
    frames: VecDeque<FrameRecord>,
    capacity: usize,
    total_frames: u64,
    programs: Vec<(ProgramId, String)>,
    resizes: Vec<(u32, u32)>,
}

/// Shared view of what a [`HeadlessBackend`] received.
#[derive(Debug, Clone, Default)]
pub struct FrameLog(Arc<Mutex<LogInner>>);

impl FrameLog {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self(Arc::new(Mutex::new(LogInner {
            capacity: capacity.max(1),
            ..LogInner::default()
        })))
    }

    #[must_use]
    pub fn last(&self) -> Option<FrameRecord> {
        self.0.lock().frames.back().cloned()
    }

    /// Retained frames, oldest first.
    #[must_use]
    pub fn frames(&self) -> Vec<FrameRecord> {
        self.0.lock().frames.iter().cloned().collect()
    }

    #[must_use]
    pub fn total_frames(&self) -> u64 {
        self.0.lock().total_frames
    }

    #[must_use]
    pub fn program_labels(&self) -> Vec<String> {
        self.0.lock().programs.iter().map(|(_, l)| l.clone()).collect()
    }

    #[must_use]
    pub fn program_count(&self) -> usize {
        self.0.lock().programs.len()
    }

    /// Every size the backend was resized to, in order.
    #[must_use]
    pub fn resizes(&self) -> Vec<(u32, u32)> {
        self.0.lock().resizes.clone()
    }
}

pub struct HeadlessBackend {
    log: FrameLog,
}

impl HeadlessBackend {
    #[must_use]
    pub fn new() -> (Self, FrameLog) {
        let log = FrameLog::with_capacity(DEFAULT_CAPACITY);
        (Self { log: log.clone() }, log)
    }
}

impl RenderBackend for HeadlessBackend {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.log.0.lock().resizes.push((width, height));
    }

    fn create_program(&mut self, id: ProgramId, desc: &ProgramDesc) -> Result<()> {
        self.log.0.lock().programs.push((id, desc.label.clone()));
        Ok(())
    }

    fn render(&mut self, frame: &FramePacket<'_>) -> Result<()> {
        let record = FrameRecord {
            frame_index: frame.frame_index,
            size: frame.size,
            clear_color: frame.clear_color,
            light_count: frame.globals.light_count(),
            has_shadow_pass: frame.shadow.is_some(),
            background: frame.background.as_ref().map(|b| b.map.id()),
            draws: frame
                .draws
                .iter()
                .map(|d| DrawRecord {
                    node: d.node,
                    material: d.material,
                    program: d.program,
                    fallback: d.fallback,
                    model: d.model.model,
                    uniforms: d.uniforms.clone(),
                })
                .collect(),
        };

        let mut inner = self.log.0.lock();
        if inner.frames.len() == inner.capacity {
            inner.frames.pop_front();
        }
        inner.frames.push_back(record);
        inner.total_frames += 1;
        Ok(())
    }
}
