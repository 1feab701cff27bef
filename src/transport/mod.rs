//! Tokio implementations of the collaborator traits.
//!
//! - [`SntpSocket`] / [`UdpTransport`]: one UDP socket, shared send half
//! - [`DnsResolver`]: system resolver with a per-lookup timeout
//! - [`TokioDeadlines`]: one-shot timers as abortable tasks
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          SyncStateMachine               │
//! ├─────────────┬─────────────┬─────────────┤
//! │ DnsResolver │ UdpTransport│TokioDeadlines│  ← This module
//! ├─────────────┴─────────────┴─────────────┤
//! │              tokio                      │
//! └─────────────────────────────────────────┘
//! ```
//!
//! Everything completes through the event queue; nothing here touches the
//! state machine directly.

mod deadline;
mod resolver;
mod socket;

pub use deadline::*;
pub use resolver::*;
pub use socket::*;
