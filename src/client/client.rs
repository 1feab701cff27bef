//! High-level SNTP client API.
//!
//! Provides `SntpClient<S>`, which owns the socket and the background tasks
//! that keep the shared time state synchronized.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::core::{ClockError, EpochSeconds, EventReceiver, EventSender, SyncEvent, event_queue};
use crate::sync::{SyncConfig, SyncStateMachine, SyncStats, TimeReader, shared_time_with};
use crate::transport::{DnsResolver, SntpSocket, TokioDeadlines, UdpTransport};

/// Pause after a failed socket receive before trying again.
const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(50);

type ClientMachine<S> = SyncStateMachine<DnsResolver, UdpTransport, TokioDeadlines, S>;

/// A running SNTP client.
///
/// Generic over a resource `S` guarded together with the published time
/// (see [`TimeReader::with_resource`]).
///
/// # Example
///
/// ```ignore
/// use sntp_clock::client::SntpClient;
/// use sntp_clock::sync::SyncConfig;
///
/// let client = SntpClient::start(SyncConfig::from_env()?).await?;
/// let reader = client.reader();
///
/// // Any thread, any time:
/// let now = reader.read();
/// if !now.is_unknown() {
///     println!("unix time {now}");
/// }
///
/// client.shutdown().await;
/// ```
pub struct SntpClient<S = ()> {
    /// Read side of the shared time state.
    reader: TimeReader<S>,

    /// Latest counters from the driver task.
    stats: watch::Receiver<SyncStats>,

    /// Event queue into the driver task.
    events: EventSender,

    /// Address the socket is bound to.
    local_addr: SocketAddr,

    /// Shutdown signal.
    shutdown_tx: Option<oneshot::Sender<()>>,

    driver: Option<JoinHandle<()>>,
    receiver: JoinHandle<()>,
}

impl SntpClient<()> {
    /// Bind the socket and start synchronizing.
    ///
    /// The first attempt starts immediately.
    pub async fn start(config: SyncConfig) -> Result<Self, ClockError> {
        Self::start_with_resource(config, ()).await
    }
}

impl<S: Send + 'static> SntpClient<S> {
    /// Like [`SntpClient::start`], guarding `resource` with the time state.
    pub async fn start_with_resource(config: SyncConfig, resource: S) -> Result<Self, ClockError> {
        config.validate()?;

        let socket = SntpSocket::bind(config.bind_addr).await?;
        let local_addr = socket.local_addr()?;
        // The first attempt sends without awaiting; readiness must be known.
        socket.writable().await?;

        let resolver = DnsResolver::new(config.resolve_timeout, local_addr.is_ipv6());
        let transport = socket.transport();
        let (events_tx, events_rx) = event_queue();
        let (publisher, reader) = shared_time_with(resource);
        let (stats_tx, stats_rx) = watch::channel(SyncStats::default());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        info!(
            %local_addr,
            server = %config.server_host,
            port = config.server_port,
            poll = ?config.poll_interval,
            "starting SNTP client"
        );

        let machine = SyncStateMachine::new(
            config,
            resolver,
            transport,
            TokioDeadlines::new(),
            events_tx.clone(),
            publisher,
            Instant::now(),
        );

        let receiver = tokio::spawn(receive_loop(socket, events_tx.clone()));
        let driver = tokio::spawn(drive(machine, events_rx, stats_tx, shutdown_rx));

        Ok(Self {
            reader,
            stats: stats_rx,
            events: events_tx,
            local_addr,
            shutdown_tx: Some(shutdown_tx),
            driver: Some(driver),
            receiver,
        })
    }

    /// A reader for the shared time state. Cheap to clone, usable anywhere.
    pub fn reader(&self) -> TimeReader<S> {
        self.reader.clone()
    }

    /// Last synchronized time, or [`EpochSeconds::UNKNOWN`].
    pub fn now(&self) -> EpochSeconds {
        self.reader.read()
    }

    /// Watch the attempt counters.
    pub fn stats(&self) -> watch::Receiver<SyncStats> {
        self.stats.clone()
    }

    /// Start an attempt now instead of waiting for the poll interval.
    ///
    /// Ignored while an attempt is in progress. Returns `false` if the
    /// client has stopped.
    pub fn resync(&self) -> bool {
        self.events.send(SyncEvent::SyncNow)
    }

    /// Address the client socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop the background tasks and wait for the driver to exit.
    ///
    /// The last published time stays readable through existing readers.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(driver) = self.driver.take() {
            let _ = driver.await;
        }
        self.receiver.abort();
    }
}

impl<S> Drop for SntpClient<S> {
    fn drop(&mut self) {
        // Send shutdown signal if not already sent
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.receiver.abort();
    }
}

impl<S> std::fmt::Debug for SntpClient<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SntpClient")
            .field("local_addr", &self.local_addr)
            .field("running", &self.shutdown_tx.is_some())
            .finish()
    }
}

/// Forward every datagram on the socket to the event queue.
async fn receive_loop(mut socket: SntpSocket, events: EventSender) {
    loop {
        match socket.recv_from().await {
            Ok((payload, from)) => {
                trace!(%from, len = payload.len(), "datagram received");
                if !events.datagram_received(from, payload.to_vec()) {
                    break;
                }
            }
            Err(error) => {
                // ICMP errors from earlier sends surface here on some platforms.
                debug!(%error, "socket receive failed");
                tokio::time::sleep(RECV_ERROR_BACKOFF).await;
            }
        }
    }
}

/// Run the state machine until shutdown.
async fn drive<S>(
    mut machine: ClientMachine<S>,
    mut events: EventReceiver,
    stats: watch::Sender<SyncStats>,
    mut shutdown: oneshot::Receiver<()>,
) {
    loop {
        let wake = machine.poll(Instant::now());
        stats.send_if_modified(|current| {
            if *current == *machine.stats() {
                return false;
            }
            *current = machine.stats().clone();
            true
        });

        let sleep = async {
            match wake {
                Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = &mut shutdown => {
                debug!("SNTP client shutting down");
                break;
            }
            event = events.recv() => match event {
                Some(event) => machine.handle(event, Instant::now()),
                None => {
                    warn!("event queue closed");
                    break;
                }
            },
            _ = sleep => {}
        }
    }
}
