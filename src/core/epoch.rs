//! Canonical timestamp type.

use std::fmt;
use std::time::Duration;

use super::constants::NTP_UNIX_DELTA;

/// Whole seconds since the Unix epoch (1970-01-01T00:00:00Z).
///
/// Zero doubles as the "unknown" sentinel: a clock that has never been
/// synchronized reads [`EpochSeconds::UNKNOWN`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EpochSeconds(i64);

impl EpochSeconds {
    /// Sentinel for "not yet synchronized".
    pub const UNKNOWN: Self = Self(0);

    /// Wrap a raw Unix timestamp.
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    /// Convert a transmit-timestamp seconds field (1900 epoch) to Unix seconds.
    ///
    /// Exact integer arithmetic; values before 1970 come out negative rather
    /// than wrapping.
    pub const fn from_ntp_seconds(ntp_seconds: u32) -> Self {
        Self(ntp_seconds as i64 - NTP_UNIX_DELTA)
    }

    /// Raw seconds since the Unix epoch.
    pub const fn as_secs(self) -> i64 {
        self.0
    }

    /// Whether this is the "unknown" sentinel.
    pub const fn is_unknown(self) -> bool {
        self.0 == Self::UNKNOWN.0
    }

    /// Move the timestamp forward by whole seconds of `elapsed`.
    pub fn advanced_by(self, elapsed: Duration) -> Self {
        let secs = i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX);
        Self(self.0.saturating_add(secs))
    }
}

impl fmt::Display for EpochSeconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            f.write_str("unknown")
        } else {
            write!(f, "{}", self.0)
        }
    }
}
