//! SNTP client on the tokio runtime.
//!
//! Wires the state machine to [`crate::transport`] and runs it in the
//! background.

#[allow(clippy::module_inception)]
mod client;

pub use client::*;
