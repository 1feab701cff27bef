//! # sntp-clock
//!
//! A minimal SNTP client that keeps one shared "current Unix time" value up
//! to date for any number of concurrent consumers.
//!
//! - **Transport-agnostic**: the protocol is a state machine written against
//!   three small traits (hostname lookup, datagram send, one-shot timers)
//! - **Simple**: one request per attempt, fixed poll interval, no backoff
//! - **Safe to share**: a single writer publishes under a short lock; readers
//!   on any thread never see a partial update
//!
//! ## Feature Flags
//!
//! - `runtime` (default): tokio collaborators and the [`client::SntpClient`] driver
//!
//! ## Modules
//!
//! - [`core`]: Constants, error types, events, and collaborator traits (always included)
//! - [`codec`]: Request encoding and response validation (always included)
//! - [`sync`]: State machine and shared time state (always included)
//! - [`transport`]: Tokio socket, resolver, and timers (requires `runtime` feature)
//! - [`client`]: Background client handle (requires `runtime` feature)
//!
//! ## Example Usage
//!
//! ```rust
//! use std::time::Instant;
//! use sntp_clock::prelude::*;
//!
//! // A resolver that already knows the answer.
//! struct Fixed;
//! impl Resolver for Fixed {
//!     fn resolve(&mut self, _host: &str, on_complete: ResolveCompletion) {
//!         on_complete.complete(Ok([192, 0, 2, 10].into()));
//!     }
//! }
//!
//! // A transport that drops everything, and timers that never fire.
//! struct Discard;
//! impl Transport for Discard {
//!     fn send_datagram(&mut self, _: std::net::SocketAddr, _: &[u8]) -> Result<(), TransportError> {
//!         Ok(())
//!     }
//! }
//! struct Never;
//! impl DeadlineService for Never {
//!     fn schedule_once(&mut self, _: std::time::Duration, _: DeadlineCompletion) -> DeadlineHandle {
//!         DeadlineHandle::new(1)
//!     }
//!     fn cancel(&mut self, _: DeadlineHandle) {}
//! }
//!
//! let (events_tx, mut events) = event_queue();
//! let (publisher, reader) = shared_time();
//! let mut machine = SyncStateMachine::new(
//!     SyncConfig::default(), Fixed, Discard, Never, events_tx, publisher, Instant::now(),
//! );
//!
//! machine.poll(Instant::now());
//! while let Some(event) = events.try_recv() {
//!     machine.handle(event, Instant::now());
//! }
//! assert_eq!(machine.phase(), SyncPhase::AwaitingResponse);
//!
//! // A server reply: mode 4, stratum 1, transmit time 2024-01-01T00:00:00Z.
//! let mut reply = [0u8; NTP_MSG_LEN];
//! reply[0] = 0x24;
//! reply[1] = 1;
//! reply[40..44].copy_from_slice(&3_913_056_000u32.to_be_bytes());
//! machine.handle(
//!     SyncEvent::Datagram { from: ([192, 0, 2, 10], 123).into(), payload: reply.to_vec() },
//!     Instant::now(),
//! );
//!
//! assert_eq!(reader.read().as_secs(), 1_704_067_200);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core module (always included)
pub mod core;

// Wire format (always included)
pub mod codec;

// Sync layer (always included)
pub mod sync;

// Tokio collaborators (feature-gated)
#[cfg(feature = "runtime")]
#[cfg_attr(docsrs, doc(cfg(feature = "runtime")))]
pub mod transport;

// Client API (feature-gated)
#[cfg(feature = "runtime")]
#[cfg_attr(docsrs, doc(cfg(feature = "runtime")))]
pub mod client;

/// Prelude module for convenient imports.
pub mod prelude {
    // Core traits and types
    pub use crate::core::*;

    pub use crate::codec::{decode_response, encode_request};

    pub use crate::sync::{
        SyncConfig, SyncConfigBuilder, SyncPhase, SyncStateMachine, SyncStats, TimePublisher,
        TimeReader, TimeSnapshot, shared_time, shared_time_with,
    };

    // Runtime types (when enabled)
    #[cfg(feature = "runtime")]
    pub use crate::client::SntpClient;

    #[cfg(feature = "runtime")]
    pub use crate::transport::{DnsResolver, SntpSocket, TokioDeadlines, UdpTransport};
}

// Re-export commonly used items at crate root
pub use crate::core::{ClockError, EpochSeconds, SyncFailure};
pub use crate::sync::{SyncConfig, TimeReader};

#[cfg(feature = "runtime")]
pub use crate::client::SntpClient;
