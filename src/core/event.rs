//! Event queue feeding the state machine.
//!
//! Collaborator completions, received datagrams, and deadline expiries are
//! all turned into [`SyncEvent`]s and queued. The queue is drained by a
//! single consumer, which gives the state machine its serial control flow:
//! a completion invoked inline from inside a collaborator call is only
//! enqueued, and is processed after that call has returned.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use tokio::sync::mpsc;

use super::error::ResolveError;

/// Identity of one resolve → send → await cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttemptId(u64);

impl AttemptId {
    /// Wrap a raw attempt number.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The attempt after this one.
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Input to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Re-evaluate timers; starts an attempt if one is due.
    Tick,
    /// Bring the next attempt forward to now.
    SyncNow,
    /// A resolver completion.
    Resolved {
        /// Attempt that issued the lookup.
        attempt: AttemptId,
        /// Lookup result.
        result: Result<IpAddr, ResolveError>,
    },
    /// A datagram arrived on the client socket.
    Datagram {
        /// Source address and port.
        from: SocketAddr,
        /// Raw payload.
        payload: Vec<u8>,
    },
    /// A resend deadline expired.
    DeadlineFired {
        /// Attempt that armed the deadline.
        attempt: AttemptId,
    },
}

/// Create a connected event queue.
pub fn event_queue() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, EventReceiver { rx })
}

/// Producer side of the event queue.
///
/// Cheap to clone and never blocks.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<SyncEvent>,
}

impl EventSender {
    /// Queue an event.
    ///
    /// Returns `false` if the consumer is gone.
    pub fn send(&self, event: SyncEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    /// Queue a received datagram.
    pub fn datagram_received(&self, from: SocketAddr, payload: Vec<u8>) -> bool {
        self.send(SyncEvent::Datagram { from, payload })
    }

    /// Check if the consumer has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side of the event queue.
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::UnboundedReceiver<SyncEvent>,
}

impl EventReceiver {
    /// Wait for the next event.
    ///
    /// Returns `None` once every sender is dropped.
    pub async fn recv(&mut self) -> Option<SyncEvent> {
        self.rx.recv().await
    }

    /// Take the next event if one is queued.
    pub fn try_recv(&mut self) -> Option<SyncEvent> {
        self.rx.try_recv().ok()
    }
}

/// One-shot completion for a [`Resolver::resolve`](super::Resolver::resolve) call.
///
/// Completing consumes the handle, so at most one result is reported.
/// Dropping it without completing reports [`ResolveError::Abandoned`], so
/// exactly one result always reaches the state machine.
#[derive(Debug)]
pub struct ResolveCompletion {
    attempt: AttemptId,
    events: Option<EventSender>,
}

impl ResolveCompletion {
    /// Create a completion for `attempt`.
    pub fn new(attempt: AttemptId, events: EventSender) -> Self {
        Self {
            attempt,
            events: Some(events),
        }
    }

    /// Attempt this lookup belongs to.
    pub fn attempt(&self) -> AttemptId {
        self.attempt
    }

    /// Report the lookup result.
    pub fn complete(mut self, result: Result<IpAddr, ResolveError>) {
        self.deliver(result);
    }

    fn deliver(&mut self, result: Result<IpAddr, ResolveError>) {
        if let Some(events) = self.events.take() {
            events.send(SyncEvent::Resolved {
                attempt: self.attempt,
                result,
            });
        }
    }
}

impl Drop for ResolveCompletion {
    fn drop(&mut self) {
        self.deliver(Err(ResolveError::Abandoned));
    }
}

/// One-shot callback for a [`DeadlineService`](super::DeadlineService) timer.
#[derive(Debug, Clone)]
pub struct DeadlineCompletion {
    attempt: AttemptId,
    events: EventSender,
}

impl DeadlineCompletion {
    /// Create a deadline callback for `attempt`.
    pub fn new(attempt: AttemptId, events: EventSender) -> Self {
        Self { attempt, events }
    }

    /// Attempt that armed this deadline.
    pub fn attempt(&self) -> AttemptId {
        self.attempt
    }

    /// Report that the deadline expired.
    pub fn fire(self) {
        self.events.send(SyncEvent::DeadlineFired {
            attempt: self.attempt,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    #[test]
    fn test_resolve_completion_delivers_once() {
        let (tx, mut rx) = event_queue();
        let completion = ResolveCompletion::new(AttemptId::new(3), tx);
        let addr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));

        completion.complete(Ok(addr));

        assert_eq!(
            rx.try_recv(),
            Some(SyncEvent::Resolved {
                attempt: AttemptId::new(3),
                result: Ok(addr),
            })
        );
        // Completing consumed the handle; drop must not report again.
        assert_eq!(rx.try_recv(), None);
    }

    #[test]
    fn test_resolve_completion_dropped_reports_abandoned() {
        let (tx, mut rx) = event_queue();
        drop(ResolveCompletion::new(AttemptId::new(1), tx));

        assert_eq!(
            rx.try_recv(),
            Some(SyncEvent::Resolved {
                attempt: AttemptId::new(1),
                result: Err(ResolveError::Abandoned),
            })
        );
    }

    #[test]
    fn test_deadline_completion_fire() {
        let (tx, mut rx) = event_queue();
        DeadlineCompletion::new(AttemptId::new(7), tx).fire();

        assert_eq!(
            rx.try_recv(),
            Some(SyncEvent::DeadlineFired {
                attempt: AttemptId::new(7)
            })
        );
    }

    #[test]
    fn test_sender_closed_after_receiver_drop() {
        let (tx, rx) = event_queue();
        assert!(!tx.is_closed());
        drop(rx);
        assert!(tx.is_closed());
        assert!(!tx.send(SyncEvent::Tick));
    }

    #[test]
    fn test_attempt_id_next() {
        let id = AttemptId::new(1);
        assert_eq!(id.next(), AttemptId::new(2));
        assert_eq!(id.to_string(), "#1");
    }
}
