//! Utility modules

mod socket;
mod tracing_setup;

pub use socket::*;
pub use tracing_setup::{init_tracing, LogFormat};
