//! Library entry point for the pump-stream crate.
//! Re-exports the shared string type and the error taxonomy used by every actor.

#[macro_use]
pub mod macros;

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod log;
pub mod model;
pub mod net;
pub mod realtime;
pub mod utils;

pub use error::Error;
pub use utils::*;

/// Default mailbox size used by the actors of this crate.
pub const BUFFER_SIZE: usize = 128;
