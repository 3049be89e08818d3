//! Sensor conditioning module
//!
//! Stateful transforms applied to the raw readings before they reach the
//! vehicle state machine: a windowed moving-average smoother for the two
//! distance channels and a debounce detector for stop-line crossings.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod filter;
mod stop_line;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use filter::*;
pub use stop_line::*;
