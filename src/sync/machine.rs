//! Synchronization state machine.
//!
//! Drives one attempt at a time through
//!
//! ```text
//!            poll: now >= next_attempt_at
//!   Idle ─────────────────────────────────► Resolving
//!    ▲                                         │ resolved: send request,
//!    │ failed (lookup error)                   │ arm resend deadline
//!    ├─────────────────────────────────────────┤
//!    │                                         ▼
//!    │ succeeded / failed (invalid, timeout)  AwaitingResponse
//!    └─────────────────────────────────────────┘
//! ```
//!
//! Every way out of an attempt lands back in `Idle` with the next attempt
//! armed one poll interval later, so no failure leaves the machine stuck.
//! There is no backoff and no retry inside an attempt.
//!
//! The machine is driven entirely through [`SyncStateMachine::poll`] and
//! [`SyncStateMachine::handle`]; callers pass the current instant in, which
//! keeps it deterministic under test.

use std::net::{IpAddr, SocketAddr};
use std::time::Instant;

use tracing::{debug, info, warn};

use super::config::SyncConfig;
use super::shared::TimePublisher;
use super::stats::{AttemptOutcome, SyncStats};
use crate::codec::{decode_response, encode_request};
use crate::core::{
    AttemptId, DeadlineCompletion, DeadlineHandle, DeadlineService, EventSender,
    ResolveCompletion, ResolveError, Resolver, SyncEvent, SyncFailure, Transport,
};

/// Where the current attempt is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// No attempt in progress; waiting for the next one to be due.
    Idle,
    /// Waiting for the resolver.
    Resolving,
    /// Request sent, resend deadline armed.
    AwaitingResponse,
}

/// State of the attempt in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSession {
    /// Current (or most recent) attempt.
    pub attempt: Option<AttemptId>,
    /// Server address resolved for this attempt.
    pub server_address: Option<SocketAddr>,
    /// True from send until the attempt ends.
    pub request_in_flight: bool,
    /// The armed resend deadline; set iff `request_in_flight`.
    pub resend_deadline: Option<DeadlineHandle>,
    /// When the request was sent.
    pub sent_at: Option<Instant>,
}

/// The client-side synchronization protocol.
///
/// Generic over its collaborators so it can run on any network stack:
/// - `R`: hostname lookup
/// - `T`: datagram send
/// - `D`: one-shot timers
/// - `S`: resource guarded together with the published time
pub struct SyncStateMachine<R, T, D, S = ()> {
    config: SyncConfig,
    resolver: R,
    transport: T,
    deadlines: D,
    events: EventSender,
    publisher: TimePublisher<S>,

    phase: SyncPhase,
    session: SyncSession,
    last_attempt: AttemptId,
    next_attempt_at: Instant,
    stats: SyncStats,
}

impl<R, T, D, S> SyncStateMachine<R, T, D, S>
where
    R: Resolver,
    T: Transport,
    D: DeadlineService,
{
    /// Create an idle machine whose first attempt is due at `now`.
    ///
    /// `events` must feed the queue whose receiver is drained into
    /// [`SyncStateMachine::handle`].
    pub fn new(
        config: SyncConfig,
        resolver: R,
        transport: T,
        deadlines: D,
        events: EventSender,
        publisher: TimePublisher<S>,
        now: Instant,
    ) -> Self {
        Self {
            config,
            resolver,
            transport,
            deadlines,
            events,
            publisher,
            phase: SyncPhase::Idle,
            session: SyncSession::default(),
            last_attempt: AttemptId::new(0),
            next_attempt_at: now,
            stats: SyncStats::default(),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    /// Current (or most recent) attempt.
    pub fn session(&self) -> &SyncSession {
        &self.session
    }

    /// When the next attempt becomes due (meaningful while idle).
    pub fn next_attempt_at(&self) -> Instant {
        self.next_attempt_at
    }

    /// Counters over all attempts.
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// The configuration this machine runs with.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Start an attempt if one is due.
    ///
    /// Returns the instant the caller should poll again, or `None` while an
    /// attempt is in progress (it will end through an event).
    pub fn poll(&mut self, now: Instant) -> Option<Instant> {
        if self.phase == SyncPhase::Idle && now >= self.next_attempt_at {
            self.start_attempt();
        }

        match self.phase {
            SyncPhase::Idle => Some(self.next_attempt_at),
            SyncPhase::Resolving | SyncPhase::AwaitingResponse => None,
        }
    }

    /// Bring the next attempt forward to `now`.
    ///
    /// Has no effect while an attempt is already in progress.
    pub fn request_sync(&mut self, now: Instant) {
        if self.phase == SyncPhase::Idle {
            self.next_attempt_at = now;
            self.poll(now);
        }
    }

    /// Process one event from the queue.
    pub fn handle(&mut self, event: SyncEvent, now: Instant) {
        match event {
            SyncEvent::Tick => {
                self.poll(now);
            }
            SyncEvent::SyncNow => self.request_sync(now),
            SyncEvent::Resolved { attempt, result } => self.on_resolved(attempt, result, now),
            SyncEvent::Datagram { from, payload } => self.on_datagram(from, &payload, now),
            SyncEvent::DeadlineFired { attempt } => self.on_deadline(attempt, now),
        }

        debug_assert_eq!(
            self.session.resend_deadline.is_some(),
            self.session.request_in_flight,
            "resend deadline must be armed exactly while a request is in flight"
        );
    }

    fn start_attempt(&mut self) {
        let attempt = self.last_attempt.next();
        self.last_attempt = attempt;
        self.session = SyncSession {
            attempt: Some(attempt),
            ..SyncSession::default()
        };
        self.phase = SyncPhase::Resolving;
        self.stats.on_attempt_started();

        debug!(%attempt, host = %self.config.server_host, "resolving time server");
        let on_complete = ResolveCompletion::new(attempt, self.events.clone());
        self.resolver.resolve(&self.config.server_host, on_complete);
    }

    fn is_current(&self, phase: SyncPhase, attempt: AttemptId) -> bool {
        self.phase == phase && self.session.attempt == Some(attempt)
    }

    fn on_resolved(
        &mut self,
        attempt: AttemptId,
        result: Result<IpAddr, ResolveError>,
        now: Instant,
    ) {
        if !self.is_current(SyncPhase::Resolving, attempt) {
            debug!(%attempt, "ignoring stale resolution");
            return;
        }

        let ip = match result {
            Ok(ip) => ip,
            Err(error) => {
                self.finish(AttemptOutcome::Failed(error.into()), now);
                return;
            }
        };

        let server = SocketAddr::new(ip, self.config.server_port);
        self.session.server_address = Some(server);

        // A failed send is not retried; the resend deadline ends the attempt.
        if let Err(error) = self.transport.send_datagram(server, &encode_request()) {
            warn!(%attempt, %server, %error, "failed to send time request");
        } else {
            debug!(%attempt, %server, "time request sent");
        }

        debug_assert!(self.session.resend_deadline.is_none());
        let on_fire = DeadlineCompletion::new(attempt, self.events.clone());
        let handle = self
            .deadlines
            .schedule_once(self.config.resend_timeout, on_fire);

        self.session.resend_deadline = Some(handle);
        self.session.request_in_flight = true;
        self.session.sent_at = Some(now);
        self.phase = SyncPhase::AwaitingResponse;
    }

    fn on_datagram(&mut self, from: SocketAddr, payload: &[u8], now: Instant) {
        let server = match self.session.server_address {
            Some(server)
                if self.phase == SyncPhase::AwaitingResponse && self.session.request_in_flight =>
            {
                server
            }
            _ => {
                debug!(%from, len = payload.len(), "ignoring datagram with no request in flight");
                return;
            }
        };

        let outcome = match decode_response(payload, from, server) {
            Ok(epoch) => {
                self.cancel_resend_deadline();
                self.publisher.publish(epoch, now);
                AttemptOutcome::Succeeded(epoch)
            }
            Err(error) => AttemptOutcome::Failed(error.into()),
        };
        self.finish(outcome, now);
    }

    fn on_deadline(&mut self, attempt: AttemptId, now: Instant) {
        if !self.is_current(SyncPhase::AwaitingResponse, attempt) {
            debug!(%attempt, "ignoring stale resend deadline");
            return;
        }
        self.finish(AttemptOutcome::Failed(SyncFailure::ResponseTimeout), now);
    }

    fn cancel_resend_deadline(&mut self) {
        if let Some(handle) = self.session.resend_deadline.take() {
            self.deadlines.cancel(handle);
        }
    }

    fn finish(&mut self, outcome: AttemptOutcome, now: Instant) {
        self.cancel_resend_deadline();

        let round_trip = match outcome {
            AttemptOutcome::Succeeded(_) => self
                .session
                .sent_at
                .map(|sent| now.saturating_duration_since(sent)),
            AttemptOutcome::Failed(_) => None,
        };

        self.session.request_in_flight = false;
        self.phase = SyncPhase::Idle;
        self.next_attempt_at = now
            .checked_add(self.config.poll_interval)
            .unwrap_or(now);
        self.stats.on_attempt_finished(&outcome, round_trip);

        let attempt = self.last_attempt;
        match &outcome {
            AttemptOutcome::Succeeded(epoch) => {
                info!(%attempt, %epoch, rtt = ?round_trip, "time synchronized");
            }
            AttemptOutcome::Failed(failure) => {
                warn!(%attempt, %failure, "time synchronization failed");
            }
        }
    }
}

impl<R, T, D, S> std::fmt::Debug for SyncStateMachine<R, T, D, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncStateMachine")
            .field("server_host", &self.config.server_host)
            .field("phase", &self.phase)
            .field("session", &self.session)
            .field("next_attempt_at", &self.next_attempt_at)
            .finish()
    }
}
