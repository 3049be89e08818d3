//! # Vehicle control module
//!
//! This module implements the [`VehCtrl`] state machine, the decision core
//! of the shuttle. The vehicle is always in exactly one control state:
//!
//! - `Normal` - Following the line between intersections.
//! - `Intersection` - Turning through an intersection.
//! - `StopLine` - Stationary at a stop line, waiting on the next instruction.
//! - `Stopping` - Decelerating, resolves to the recorded stop reason once the
//!   vehicle has come to rest.
//! - `Blocked` - Stationary behind an obstacle, waiting for it to clear.
//!
//! Each cycle the module consumes one set of raw sensor readings, smooths
//! the distance channels, evaluates exactly one state transition and derives
//! one control command. Anomalies are logged and absorbed with a safe
//! fallback, the cycle itself never fails.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod cmd;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use cmd::*;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Distance substituted when a sensor reports "nothing detected".
///
/// Units: sensor distance units
pub const FAR_DISTANCE: i32 = 1000;

/// Initial value seeding the obstacle distance filter.
pub(crate) const OBSTACLE_FILTER_SEED: i32 = 100;

/// Initial value seeding the stop distance filter.
///
/// Zero, the vehicle is assumed to start at a stop line.
pub(crate) const STOP_FILTER_SEED: i32 = 0;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during VehCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum VehCtrlError {
    #[error("Failed to load the parameter file: {0}")]
    ParamLoadError(#[from] util::params::LoadError),
}
