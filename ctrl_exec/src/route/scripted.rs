//! Table-driven route solver

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::collections::HashMap;

// Internal
use super::{RouteError, RouteSolver};
use crate::veh_ctrl::InstructionKind;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A [`RouteSolver`] backed by a table of pre-computed legs.
///
/// Each `(start, target)` pair is registered up front with its instruction
/// and segment sequences. Used by the replay binary and in tests, where a
/// full graph solver would add nothing.
#[derive(Debug, Default)]
pub struct ScriptedRouteSolver {
    routes: HashMap<(String, String), Leg>,
    last: Leg,
}

/// One pre-computed leg of the route table.
#[derive(Clone, Debug, Default)]
struct Leg {
    instructions: Vec<InstructionKind>,
    segments: Vec<String>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptedRouteSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the solver output for one `(start, target)` pair.
    ///
    /// `instructions` and `segments` must be equal length and index-aligned.
    pub fn add_route(
        &mut self,
        start: &str,
        target: &str,
        instructions: Vec<InstructionKind>,
        segments: Vec<String>,
    ) {
        self.routes.insert(
            (start.to_string(), target.to_string()),
            Leg {
                instructions,
                segments,
            },
        );
    }
}

impl RouteSolver for ScriptedRouteSolver {
    fn solve(&mut self, start: &str, target: &str) -> Result<(), RouteError> {
        match self.routes.get(&(start.to_string(), target.to_string())) {
            Some(leg) => {
                self.last = leg.clone();
                Ok(())
            }
            None => Err(RouteError::NoRoute(start.to_string(), target.to_string())),
        }
    }

    fn drive_mission(&self) -> Vec<InstructionKind> {
        self.last.instructions.clone()
    }

    fn road_segments(&self) -> Vec<String> {
        self.last.segments.clone()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
