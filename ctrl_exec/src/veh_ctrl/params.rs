//! Parameters structure for VehCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for vehicle control.
#[derive(Debug, Deserialize)]
pub struct Params {
    // ---- SENSOR CONDITIONING ----

    /// Window length of the obstacle distance smoothing filter.
    pub obstacle_filter_len: usize,

    /// Window length of the stop distance smoothing filter.
    pub stop_filter_len: usize,

    /// Consecutive close readings before the stop-line detector latches.
    pub stop_line_consecutive: u32,

    /// Consecutive far readings before the stop-line detector releases.
    pub stop_line_high_count: u32,

    // ---- DECISION THRESHOLDS ----

    /// Smoothed obstacle distances below this mean the path is blocked.
    ///
    /// Units: sensor distance units
    pub block_distance: i32,

    /// Angle readings within `[-bound, bound]` are considered plausible by
    /// the angle recovery policy.
    ///
    /// Units: image-processing angle units
    pub angle_expected_bound: i32,

    /// Consecutive healthy image-processing status codes required before the
    /// regulation mode returns to nominal.
    pub nominal_mode_threshold: u32,

    // ---- SPEED REFERENCES ----

    /// Cruise speed reference in `Normal`.
    ///
    /// Units: sensor speed units
    pub default_speed: i32,

    /// Reduced speed reference in `Intersection`.
    ///
    /// Units: sensor speed units
    pub intersection_speed: i32,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Params {
            obstacle_filter_len: 3,
            stop_filter_len: 3,
            stop_line_consecutive: 2,
            stop_line_high_count: 2,
            block_distance: 40,
            angle_expected_bound: 100,
            nominal_mode_threshold: 5,
            default_speed: 30,
            intersection_speed: 15,
        }
    }
}
