//! Frame loop
//!
//! - [`RenderLoopController`]: lifecycle and per-tick ordering
//! - [`Behavior`]: per-tick scene animation
//! - [`winit`]: windowed runner (feature `winit`)

pub mod behavior;
pub mod render_loop;
#[cfg(feature = "winit")]
pub mod winit;

pub use behavior::{Behavior, REFERENCE_HZ, Rate};
pub use render_loop::{FrameReport, LoopState, RenderLoopController};
