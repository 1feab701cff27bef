//! Per-attempt diagnostics.

use std::time::Duration;

use crate::core::{EpochSeconds, SyncFailure};

/// How an attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// A valid response was decoded and published.
    Succeeded(EpochSeconds),
    /// The attempt failed; the next poll will retry.
    Failed(SyncFailure),
}

impl AttemptOutcome {
    /// Check if the attempt succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }
}

/// Running counters over all attempts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Attempts started.
    pub attempts: u64,
    /// Attempts that published a time.
    pub successes: u64,
    /// Attempts that ended in a resolver error.
    pub resolution_failures: u64,
    /// Attempts that ended because the resend deadline fired.
    pub timeouts: u64,
    /// Attempts that ended on a rejected response.
    pub invalid_responses: u64,
    /// Outcome of the most recent finished attempt.
    pub last_outcome: Option<AttemptOutcome>,
    /// Request-to-response time of the most recent success.
    pub last_round_trip: Option<Duration>,
}

impl SyncStats {
    /// Count a started attempt.
    pub fn on_attempt_started(&mut self) {
        self.attempts += 1;
    }

    /// Count a finished attempt.
    pub fn on_attempt_finished(&mut self, outcome: &AttemptOutcome, round_trip: Option<Duration>) {
        match outcome {
            AttemptOutcome::Succeeded(_) => {
                self.successes += 1;
                self.last_round_trip = round_trip;
            }
            AttemptOutcome::Failed(SyncFailure::ResolutionFailure(_)) => {
                self.resolution_failures += 1;
            }
            AttemptOutcome::Failed(SyncFailure::ResponseTimeout) => self.timeouts += 1,
            AttemptOutcome::Failed(SyncFailure::ResponseInvalid(_)) => {
                self.invalid_responses += 1;
            }
        }
        self.last_outcome = Some(outcome.clone());
    }

    /// Failed attempts of any kind.
    pub fn failures(&self) -> u64 {
        self.resolution_failures + self.timeouts + self.invalid_responses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ResolveError, ResponseError};

    #[test]
    fn test_counts_by_kind() {
        let mut stats = SyncStats::default();

        for outcome in [
            AttemptOutcome::Failed(SyncFailure::ResolutionFailure(ResolveError::TimedOut)),
            AttemptOutcome::Failed(SyncFailure::ResponseTimeout),
            AttemptOutcome::Failed(SyncFailure::ResponseInvalid(ResponseError::Unsynchronized)),
            AttemptOutcome::Succeeded(EpochSeconds::from_secs(10)),
        ] {
            stats.on_attempt_started();
            stats.on_attempt_finished(&outcome, Some(Duration::from_millis(12)));
        }

        assert_eq!(stats.attempts, 4);
        assert_eq!(stats.successes, 1);
        assert_eq!(stats.failures(), 3);
        assert_eq!(stats.resolution_failures, 1);
        assert_eq!(stats.timeouts, 1);
        assert_eq!(stats.invalid_responses, 1);
        assert_eq!(stats.last_round_trip, Some(Duration::from_millis(12)));
        assert!(stats.last_outcome.as_ref().is_some_and(AttemptOutcome::is_success));
    }

    #[test]
    fn test_failure_keeps_previous_round_trip() {
        let mut stats = SyncStats::default();
        stats.on_attempt_finished(
            &AttemptOutcome::Succeeded(EpochSeconds::from_secs(1)),
            Some(Duration::from_millis(40)),
        );
        stats.on_attempt_finished(&AttemptOutcome::Failed(SyncFailure::ResponseTimeout), None);

        assert_eq!(stats.last_round_trip, Some(Duration::from_millis(40)));
        assert_eq!(
            stats.last_outcome,
            Some(AttemptOutcome::Failed(SyncFailure::ResponseTimeout))
        );
    }
}
