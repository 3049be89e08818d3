//! Utility library for the shuttle control software

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod logger;
pub mod module;
pub mod params;
