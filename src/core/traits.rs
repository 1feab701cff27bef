//! Collaborator traits.
//!
//! The state machine never performs I/O itself. It asks these collaborators
//! to start work and receives their completions as [`SyncEvent`]s on its
//! event queue, so every completion is handled on the machine's own serial
//! control flow.
//!
//! All three calls MUST return without blocking on the network.
//!
//! [`SyncEvent`]: super::SyncEvent

use std::net::SocketAddr;
use std::time::Duration;

use super::error::TransportError;
use super::event::{DeadlineCompletion, ResolveCompletion};

/// Asynchronous hostname lookup.
pub trait Resolver {
    /// Start resolving `host`.
    ///
    /// The result is reported through `on_complete`, either later or before
    /// this call returns. A completion dropped without a result reports
    /// [`ResolveError::Abandoned`](super::ResolveError::Abandoned).
    fn resolve(&mut self, host: &str, on_complete: ResolveCompletion);
}

/// Fire-and-forget datagram sender.
///
/// Received datagrams are not pulled through this trait; the owner of the
/// socket pushes them with [`EventSender::datagram_received`](super::EventSender::datagram_received).
pub trait Transport {
    /// Send one datagram to `to`.
    fn send_datagram(&mut self, to: SocketAddr, payload: &[u8]) -> Result<(), TransportError>;
}

/// Identifier of a scheduled one-shot deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeadlineHandle(u64);

impl DeadlineHandle {
    /// Wrap a service-specific identifier.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// One-shot timer service.
pub trait DeadlineService {
    /// Fire `on_fire` once `delay` has elapsed, unless canceled first.
    fn schedule_once(&mut self, delay: Duration, on_fire: DeadlineCompletion) -> DeadlineHandle;

    /// Cancel a scheduled deadline.
    ///
    /// MUST be idempotent: canceling a deadline that already fired or was
    /// already canceled is a no-op.
    fn cancel(&mut self, handle: DeadlineHandle);
}
