//! Load progress
//!
//! Percentages are computed per asset as `round(loaded / total * 100)`,
//! clamped to 100. A source that does not announce its size yields
//! [`LoadProgress::Indeterminate`], reported to hosts as `-1`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadProgress {
    Percent(u8),
    Indeterminate,
}

impl LoadProgress {
    #[must_use]
    pub fn from_bytes(loaded: u64, total: Option<u64>) -> Self {
        match total {
            None => Self::Indeterminate,
            Some(0) => Self::Percent(100),
            Some(total) => {
                let ratio = loaded as f64 / total as f64;
                Self::Percent((ratio * 100.0).round().clamp(0.0, 100.0) as u8)
            }
        }
    }

    /// Percentage, or `-1` when indeterminate.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Percent(p) => i32::from(p),
            Self::Indeterminate => -1,
        }
    }

    #[must_use]
    pub fn is_complete(self) -> bool {
        self == Self::Percent(100)
    }
}

/// Turns raw chunk notifications for one asset into a monotonic sequence of
/// distinct progress values.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    last: Option<LoadProgress>,
}

impl ProgressTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the new value when it should be reported, `None` when it
    /// repeats or would go backwards.
    pub fn update(&mut self, loaded: u64, total: Option<u64>) -> Option<LoadProgress> {
        let next = LoadProgress::from_bytes(loaded, total);
        let report = match (self.last, next) {
            (None, _) => true,
            (Some(LoadProgress::Percent(prev)), LoadProgress::Percent(p)) => p > prev,
            (Some(_), _) => false,
        };
        if report {
            self.last = Some(next);
            Some(next)
        } else {
            None
        }
    }

    #[must_use]
    pub fn last(&self) -> Option<LoadProgress> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_is_rounded_and_clamped() {
        assert_eq!(LoadProgress::from_bytes(1, Some(3)), LoadProgress::Percent(33));
        assert_eq!(LoadProgress::from_bytes(2, Some(3)), LoadProgress::Percent(67));
        assert_eq!(LoadProgress::from_bytes(500, Some(100)), LoadProgress::Percent(100));
        assert_eq!(LoadProgress::from_bytes(10, None).as_i32(), -1);
    }

    #[test]
    fn tracker_never_goes_backwards() {
        let mut tracker = ProgressTracker::new();
        assert_eq!(tracker.update(50, Some(100)), Some(LoadProgress::Percent(50)));
        assert_eq!(tracker.update(40, Some(100)), None);
        assert_eq!(tracker.update(50, Some(100)), None);
        assert_eq!(tracker.update(100, Some(100)), Some(LoadProgress::Percent(100)));
    }

    #[test]
    fn unknown_total_reports_indeterminate_once() {
        let mut tracker = ProgressTracker::new();
        assert_eq!(tracker.update(10, None), Some(LoadProgress::Indeterminate));
        assert_eq!(tracker.update(20, None), None);
    }
}
