//! Request encoding and response validation.

use std::net::SocketAddr;

use crate::core::{
    EpochSeconds, MODE_MASK, MODE_SERVER, NTP_MSG_LEN, OFFSET_FLAGS, OFFSET_STRATUM,
    OFFSET_TRANSMIT_SECONDS, REQUEST_HEADER, ResponseError, STRATUM_UNSYNCHRONIZED,
};

/// Build a client request: header byte set, every other byte zero.
pub fn encode_request() -> [u8; NTP_MSG_LEN] {
    let mut buf = [0u8; NTP_MSG_LEN];
    buf[OFFSET_FLAGS] = REQUEST_HEADER;
    buf
}

/// The interpreted fields of a response datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerResponse {
    /// Mode bits (low 3 bits of byte 0).
    pub mode: u8,
    /// Stratum (byte 1).
    pub stratum: u8,
    /// Transmit-timestamp seconds since 1900-01-01.
    pub transmit_seconds: u32,
}

impl ServerResponse {
    /// Parse the fields out of a datagram.
    ///
    /// Only the length is checked here; see [`ServerResponse::validate`].
    pub fn parse(bytes: &[u8]) -> Result<Self, ResponseError> {
        if bytes.len() != NTP_MSG_LEN {
            return Err(ResponseError::InvalidLength {
                expected: NTP_MSG_LEN,
                actual: bytes.len(),
            });
        }

        let mut seconds = [0u8; 4];
        seconds.copy_from_slice(&bytes[OFFSET_TRANSMIT_SECONDS..OFFSET_TRANSMIT_SECONDS + 4]);

        Ok(Self {
            mode: bytes[OFFSET_FLAGS] & MODE_MASK,
            stratum: bytes[OFFSET_STRATUM],
            transmit_seconds: u32::from_be_bytes(seconds),
        })
    }

    /// Check the mode and stratum fields.
    pub fn validate(&self) -> Result<(), ResponseError> {
        if self.mode != MODE_SERVER {
            return Err(ResponseError::InvalidMode(self.mode));
        }
        if self.stratum == STRATUM_UNSYNCHRONIZED {
            return Err(ResponseError::Unsynchronized);
        }
        Ok(())
    }

    /// Transmit time converted to the Unix epoch.
    pub fn epoch_seconds(&self) -> EpochSeconds {
        EpochSeconds::from_ntp_seconds(self.transmit_seconds)
    }
}

/// Validate a datagram against the server cached for this attempt and decode it.
///
/// Checks, in order: source address, source port, length, mode, stratum.
/// The first failing check is reported. Addresses are compared in canonical
/// form, so an IPv4-mapped source on a dual-stack socket matches its IPv4
/// server.
pub fn decode_response(
    payload: &[u8],
    from: SocketAddr,
    expected: SocketAddr,
) -> Result<EpochSeconds, ResponseError> {
    if from.ip().to_canonical() != expected.ip().to_canonical() {
        return Err(ResponseError::UnexpectedSource {
            expected: expected.ip(),
            actual: from.ip(),
        });
    }
    if from.port() != expected.port() {
        return Err(ResponseError::UnexpectedPort {
            expected: expected.port(),
            actual: from.port(),
        });
    }

    let response = ServerResponse::parse(payload)?;
    response.validate()?;
    Ok(response.epoch_seconds())
}
