//! Error types for the SNTP client.
//!
//! Attempt-level failures ([`SyncFailure`]) are absorbed by the state machine
//! and never reach a caller; they only surface in statistics and logs.

use std::io;
use std::net::IpAddr;

use thiserror::Error;

/// Errors reported by a [`Resolver`](super::Resolver) completion.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The lookup succeeded but returned no usable address.
    #[error("no address found for {host}")]
    NotFound {
        /// Hostname that was looked up.
        host: String,
    },

    /// The lookup itself failed.
    #[error("lookup failed: {0}")]
    Lookup(String),

    /// The lookup did not complete in time.
    #[error("lookup timed out")]
    TimedOut,

    /// The resolver dropped the completion without reporting a result.
    #[error("lookup abandoned by resolver")]
    Abandoned,
}

/// Reasons a received datagram is rejected, in validation order.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResponseError {
    /// Datagram did not come from the resolved server address.
    #[error("unexpected source address: expected {expected}, got {actual}")]
    UnexpectedSource {
        /// Address resolved for this attempt.
        expected: IpAddr,
        /// Address the datagram came from.
        actual: IpAddr,
    },

    /// Datagram did not come from the configured server port.
    #[error("unexpected source port: expected {expected}, got {actual}")]
    UnexpectedPort {
        /// Configured server port.
        expected: u16,
        /// Port the datagram came from.
        actual: u16,
    },

    /// Datagram is not exactly one protocol message long.
    #[error("invalid length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Fixed message length.
        expected: usize,
        /// Received length.
        actual: usize,
    },

    /// Mode field is not "server".
    #[error("invalid mode: {0}")]
    InvalidMode(u8),

    /// Stratum zero: the server is not synchronized.
    #[error("server is unsynchronized (stratum 0)")]
    Unsynchronized,
}

/// Why a synchronization attempt failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncFailure {
    /// The server name could not be resolved.
    #[error("resolution failure: {0}")]
    ResolutionFailure(#[from] ResolveError),

    /// The resend deadline fired before a valid response arrived.
    #[error("response timeout")]
    ResponseTimeout,

    /// A response arrived but failed validation.
    #[error("invalid response: {0}")]
    ResponseInvalid(#[from] ResponseError),
}

/// Errors sending a datagram.
#[derive(Debug, Error)]
pub enum TransportError {
    /// I/O error from the socket.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// The socket accepted fewer bytes than the message length.
    #[error("datagram truncated: sent {sent} of {expected} bytes")]
    Truncated {
        /// Bytes written.
        sent: usize,
        /// Bytes in the message.
        expected: usize,
    },
}

/// Invalid configuration values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No server hostname configured.
    #[error("server host must not be empty")]
    EmptyHost,

    /// A value could not be parsed or is out of range.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Setting name.
        key: &'static str,
        /// Offending value.
        value: String,
    },
}

/// Top-level client errors.
#[derive(Debug, Error)]
pub enum ClockError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// I/O error.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}
