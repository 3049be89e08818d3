//! Stop-line debounce detection

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Smoothed stop distances at or below this value count as a line hit.
///
/// Units: sensor distance units
const AT_LINE_DIST: i32 = 50;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Debounce detector for stop-line crossings.
///
/// A smoothed stop distance at or below the closeness bound counts as a hit.
/// The detector latches "at line" after `consecutive_threshold` consecutive
/// hits and releases again after `high_count_threshold` consecutive misses,
/// so a transient false positive on either edge does not flip the decision.
#[derive(Clone, Debug, Default)]
pub struct StopLineDetector {
    consecutive_threshold: u32,
    high_count_threshold: u32,
    hit_run: u32,
    miss_run: u32,
    at_line: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl StopLineDetector {
    /// Create a detector, thresholds of zero are treated as one.
    pub fn new(consecutive_threshold: u32, high_count_threshold: u32) -> Self {
        StopLineDetector {
            consecutive_threshold: consecutive_threshold.max(1),
            high_count_threshold: high_count_threshold.max(1),
            ..Default::default()
        }
    }

    /// Feed one smoothed stop distance and return the debounced decision.
    pub fn at_line(&mut self, stop_distance: i32) -> bool {
        if stop_distance <= AT_LINE_DIST {
            self.hit_run = self.hit_run.saturating_add(1);
            self.miss_run = 0;

            if self.hit_run >= self.consecutive_threshold {
                self.at_line = true;
            }
        } else {
            self.miss_run = self.miss_run.saturating_add(1);
            self.hit_run = 0;

            if self.miss_run >= self.high_count_threshold {
                self.at_line = false;
            }
        }

        self.at_line
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
