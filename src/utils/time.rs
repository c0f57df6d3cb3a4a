use std::time::{Duration, Instant};

/// Frame timer for the windowed runner.
///
/// Produces the `dt` handed to the render loop and a once-per-second frame
/// rate estimate.
pub struct Timer {
    start_time: Instant,
    last_update: Instant,
    /// Time since last tick
    pub delta: Duration,
    /// Total elapsed time since creation
    pub elapsed: Duration,
    pub frame_count: u64,

    window_frames: u32,
    window_time: Duration,
    fps: f32,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Longest step reported by [`Timer::dt_seconds`]; longer stalls (window
    /// drags, breakpoints) are clamped so animations do not jump.
    pub const MAX_DT: f32 = 0.1;

    #[must_use]
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start_time: now,
            last_update: now,
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
            window_frames: 0,
            window_time: Duration::ZERO,
            fps: 0.0,
        }
    }

    /// Advances the timer. Returns a fresh frame-rate value once per second.
    pub fn tick(&mut self) -> Option<f32> {
        let now = Instant::now();
        self.delta = now - self.last_update;
        self.elapsed = now - self.start_time;
        self.last_update = now;
        self.frame_count += 1;

        self.window_frames += 1;
        self.window_time += self.delta;
        if self.window_time.as_secs_f32() >= 1.0 {
            self.fps = self.window_frames as f32 / self.window_time.as_secs_f32();
            self.window_frames = 0;
            self.window_time = Duration::ZERO;
            return Some(self.fps);
        }
        None
    }

    #[must_use]
    pub fn dt_seconds(&self) -> f32 {
        self.delta.as_secs_f32().min(Self::MAX_DT)
    }

    #[must_use]
    pub fn fps(&self) -> f32 {
        self.fps
    }
}
