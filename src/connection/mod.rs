//! Connection management
//!
//! Handles the connection target, lifecycle state and stream handles.

mod endpoint;
mod manager;
mod state;
mod stream;

pub use endpoint::Endpoint;
pub use manager::{ConnectionManager, DEFAULT_CONNECT_TIMEOUT};
pub use stream::{InStream, OutStream};
