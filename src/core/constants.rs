//! Protocol constants for the SNTP client.
//!
//! Wire values are fixed by the protocol and MUST NOT be changed. Timing
//! values are defaults and can be overridden through `SyncConfig`.

use std::time::Duration;

// =============================================================================
// WIRE FORMAT
// =============================================================================

/// Size of every request and response datagram.
pub const NTP_MSG_LEN: usize = 48;

/// Well-known server port.
pub const NTP_PORT: u16 = 123;

/// First byte of a client request: LI = 0, VN = 3, Mode = 3 (client).
pub const REQUEST_HEADER: u8 = 0x1B;

/// Offset of the leap/version/mode byte.
pub const OFFSET_FLAGS: usize = 0;

/// Offset of the stratum byte.
pub const OFFSET_STRATUM: usize = 1;

/// Offset of the transmit-timestamp seconds field (big-endian u32).
pub const OFFSET_TRANSMIT_SECONDS: usize = 40;

/// Mask selecting the mode bits of the flags byte.
pub const MODE_MASK: u8 = 0x07;

/// Mode value of a server response.
pub const MODE_SERVER: u8 = 4;

/// Stratum value of a server that is not synchronized.
pub const STRATUM_UNSYNCHRONIZED: u8 = 0;

// =============================================================================
// EPOCHS
// =============================================================================

/// Seconds between 1900-01-01 and 1970-01-01.
pub const NTP_UNIX_DELTA: i64 = 2_208_988_800;

// =============================================================================
// TIMING
// =============================================================================

/// Default server hostname.
pub const DEFAULT_SERVER: &str = "pool.ntp.org";

/// Delay between the end of one attempt and the start of the next.
pub const POLL_INTERVAL: Duration = Duration::from_millis(30_000);

/// How long an attempt waits for a response before it is declared failed.
pub const RESEND_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Upper bound on a single hostname lookup.
pub const RESOLVE_TIMEOUT: Duration = Duration::from_millis(5_000);
