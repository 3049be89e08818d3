//! Route solving interface
//!
//! The road-graph solver lives outside the decision core. This module
//! defines the seam it is consumed through, plus a table-driven solver used
//! by the replay binary and the end-to-end tests.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod scripted;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use thiserror::Error;

// Internal
pub use scripted::*;

use crate::veh_ctrl::InstructionKind;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur while solving a route.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("No route between \"{0}\" and \"{1}\"")]
    NoRoute(String, String),
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Interface to the road-graph solver.
///
/// [`RouteSolver::solve`] computes the route for one leg and stores it
/// internally; the two accessors then return the instruction and segment
/// sequences of that leg. The sequences must be equal length and
/// index-aligned, instruction `i` departs from segment `i`.
pub trait RouteSolver {
    /// Solve the route from `start` to `target`.
    fn solve(&mut self, start: &str, target: &str) -> Result<(), RouteError>;

    /// The instruction sequence of the last solved leg.
    fn drive_mission(&self) -> Vec<InstructionKind>;

    /// The road segments of the last solved leg.
    fn road_segments(&self) -> Vec<String>;
}
