//! Link statistics
//!
//! Atomic counters describing the lifecycle history of a manager.

mod counters;

pub use counters::*;
