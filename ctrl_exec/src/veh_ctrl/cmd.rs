//! Command and state types for VehCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Control states of the vehicle state machine.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum ControlState {
    /// Following the line between intersections.
    Normal,
    /// Turning through an intersection.
    Intersection,
    /// Stationary at a stop line.
    StopLine,
    /// Decelerating, resolves to the recorded stop reason at rest.
    Stopping,
    /// Stationary behind an obstacle.
    Blocked,
}

impl Default for ControlState {
    /// The vehicle starts stationary at a stop line.
    fn default() -> Self {
        ControlState::StopLine
    }
}

/// One atomic driving action.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum InstructionKind {
    /// Drive straight ahead, following both lines.
    Forward,
    /// Turn left, following the left line.
    Left,
    /// Turn right, following the right line.
    Right,
    /// Stop at the next stop line.
    Stop,
}

/// Regulation mode passed to the downstream regulator.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum RegulationMode {
    /// Image processing healthy, full control authority.
    AutoNominal,
    /// Degraded sensing, reduced control authority.
    AutoCritical,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One step of the active mission plan.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct DriveInstruction {
    /// The action to perform.
    pub kind: InstructionKind,

    /// Opaque mission identifier, reported back to the host on completion.
    pub id: String,
}

/// Per-cycle control command emitted by VehCtrl.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct ControlCommand {
    /// Steering angle demand.
    ///
    /// Units: image-processing angle units
    pub angle: i32,

    /// Lateral position target.
    ///
    /// Units: image-processing lateral units
    pub lateral_position: i32,

    /// Speed reference for the regulator.
    ///
    /// Units: sensor speed units
    pub speed_ref: i32,

    /// Nominal or critical regulation.
    pub regulation_mode: RegulationMode,
}
