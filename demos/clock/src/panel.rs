//! Text rendering of the clock panel.
//!
//! Two blocks, UTC then Central European time, each as a heading, a
//! `dd/mm/yyyy` date line and an `hh:mm:ss` time line.

use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};
use sntp_clock::EpochSeconds;

/// Shown until the first successful synchronization.
pub const WAITING: &str = "Wait for NTP synchronization";

const CET_OFFSET_SECS: i32 = 3600;
const CEST_OFFSET_SECS: i32 = 7200;

/// The rendered panel, kept behind the client's time lock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Panel {
    lines: Vec<String>,
}

impl Panel {
    /// Redraw for `epoch`. `dst` selects CEST instead of CET.
    pub fn render(&mut self, epoch: EpochSeconds, dst: bool) {
        self.lines.clear();

        let Some(utc) = to_utc(epoch) else {
            self.lines.push(WAITING.to_string());
            return;
        };

        self.push_block("UTC", utc.fixed_offset());

        let (label, offset) = if dst {
            ("CEST", CEST_OFFSET_SECS)
        } else {
            ("CET", CET_OFFSET_SECS)
        };
        if let Some(zone) = FixedOffset::east_opt(offset) {
            self.push_block(label, utc.with_timezone(&zone));
        }
    }

    /// Current lines, top to bottom.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    fn push_block(&mut self, label: &str, at: DateTime<FixedOffset>) {
        self.lines.push(format!("Date Time {label}"));
        self.lines.push(at.format("%d/%m/%Y").to_string());
        self.lines.push(at.format("%H:%M:%S").to_string());
    }
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

fn to_utc(epoch: EpochSeconds) -> Option<DateTime<Utc>> {
    if epoch.is_unknown() {
        return None;
    }
    DateTime::from_timestamp(epoch.as_secs(), 0)
}
