//! Async UDP socket wrapper for SNTP.
//!
//! One socket serves the whole client: the receive half is owned by a task
//! that forwards datagrams to the event queue, the send half is shared with
//! the state machine through [`UdpTransport`].

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;

use crate::core::{Transport, TransportError};

/// Default receive buffer size.
///
/// Larger than any valid response so oversized datagrams are still seen
/// (and rejected on length) rather than silently cut to a valid size.
pub const DEFAULT_RECV_BUFFER_SIZE: usize = 1024;

/// Async UDP socket wrapper for SNTP.
#[derive(Debug)]
pub struct SntpSocket {
    /// The underlying UDP socket.
    socket: Arc<UdpSocket>,
    /// Receive buffer.
    recv_buffer: Vec<u8>,
}

impl SntpSocket {
    /// Create a new socket bound to the given address.
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self::from_socket(socket))
    }

    /// Wrap an existing UDP socket.
    pub fn from_socket(socket: UdpSocket) -> Self {
        Self {
            socket: Arc::new(socket),
            recv_buffer: vec![0u8; DEFAULT_RECV_BUFFER_SIZE],
        }
    }

    /// Get the local address.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Receive data and return the sender's address.
    pub async fn recv_from(&mut self) -> io::Result<(&[u8], SocketAddr)> {
        let (len, addr) = self.socket.recv_from(&mut self.recv_buffer).await?;
        Ok((&self.recv_buffer[..len], addr))
    }

    /// Wait until the socket is ready to send.
    ///
    /// A freshly bound socket reports `WouldBlock` to non-blocking sends until
    /// the reactor has seen it writable once.
    pub async fn writable(&self) -> io::Result<()> {
        self.socket.writable().await
    }

    /// Get a clone of the Arc-wrapped socket.
    pub fn socket_arc(&self) -> Arc<UdpSocket> {
        Arc::clone(&self.socket)
    }

    /// A [`Transport`] sending through this socket.
    pub fn transport(&self) -> UdpTransport {
        UdpTransport {
            socket: self.socket_arc(),
        }
    }
}

/// [`Transport`] over a shared tokio UDP socket.
///
/// Sends with `try_send_to` so the state machine never awaits; a full send
/// buffer surfaces as an I/O error and the attempt runs into its deadline.
#[derive(Debug, Clone)]
pub struct UdpTransport {
    socket: Arc<UdpSocket>,
}

impl Transport for UdpTransport {
    fn send_datagram(&mut self, to: SocketAddr, payload: &[u8]) -> Result<(), TransportError> {
        let sent = self.socket.try_send_to(payload, to)?;
        if sent != payload.len() {
            return Err(TransportError::Truncated {
                sent,
                expected: payload.len(),
            });
        }
        Ok(())
    }
}
