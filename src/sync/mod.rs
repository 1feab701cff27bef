//! Synchronization layer.
//!
//! Implements:
//! - The attempt state machine (resolve, send, await, publish)
//! - Shared time state with a single writer and many readers
//! - Configuration and per-attempt diagnostics

mod config;
mod machine;
mod shared;
mod stats;

pub use config::*;
pub use machine::*;
pub use shared::*;
pub use stats::*;
