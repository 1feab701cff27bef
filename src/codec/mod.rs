//! Wire codec for the 48-byte SNTP message.
//!
//! Only the fields the client acts on are interpreted:
//!
//! ```text
//!  byte 0        byte 1     ...    bytes 40..44
//! +--+--+-----+----------+-------+------------------------------+
//! |LI|VN|Mode | Stratum  |  ...  | Transmit seconds (BE32, 1900) |
//! +--+--+-----+----------+-------+------------------------------+
//! ```

mod packet;

pub use packet::*;
