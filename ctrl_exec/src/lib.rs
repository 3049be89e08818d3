//! Shuttle control library
//!
//! The decision core of the autonomous shuttle. Each control cycle the
//! [`veh_ctrl::VehCtrl`] module consumes one set of raw sensor readings and
//! emits one control command for the downstream regulator.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod route;
pub mod sense;
pub mod veh_ctrl;
