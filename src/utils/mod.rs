//! Utility Module
//!
//! - [`OrbitControls`]: input to camera-transform adapter
//! - [`Timer`]: frame timing for the windowed runner
//! - [`init_logging`]: one-shot `env_logger` setup for binaries and demos

pub mod logging;
pub mod orbit_control;
pub mod time;

pub use logging::init_logging;
pub use orbit_control::OrbitControls;
pub use time::Timer;
