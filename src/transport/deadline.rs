//! One-shot deadlines on the tokio timer.

use std::collections::HashMap;
use std::time::Duration;

use tokio::task::AbortHandle;

use crate::core::{DeadlineCompletion, DeadlineHandle, DeadlineService};

/// [`DeadlineService`] that runs each deadline as a sleeping task.
///
/// Canceling aborts the task. A deadline that already fired is simply
/// forgotten, so `cancel` is idempotent.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Default)]
pub struct TokioDeadlines {
    next_id: u64,
    pending: HashMap<DeadlineHandle, AbortHandle>,
}

impl TokioDeadlines {
    /// Create an empty deadline service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of deadlines scheduled and not yet canceled or finished.
    pub fn pending(&self) -> usize {
        self.pending.values().filter(|task| !task.is_finished()).count()
    }
}

impl DeadlineService for TokioDeadlines {
    fn schedule_once(&mut self, delay: Duration, on_fire: DeadlineCompletion) -> DeadlineHandle {
        self.pending.retain(|_, task| !task.is_finished());

        self.next_id = self.next_id.wrapping_add(1);
        let handle = DeadlineHandle::new(self.next_id);

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_fire.fire();
        });
        self.pending.insert(handle, task.abort_handle());
        handle
    }

    fn cancel(&mut self, handle: DeadlineHandle) {
        if let Some(task) = self.pending.remove(&handle) {
            task.abort();
        }
    }
}

impl Drop for TokioDeadlines {
    fn drop(&mut self) {
        for task in self.pending.values() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AttemptId, SyncEvent, event_queue};

    #[tokio::test]
    async fn test_deadline_fires() {
        let (tx, mut rx) = event_queue();
        let mut deadlines = TokioDeadlines::new();

        deadlines.schedule_once(
            Duration::from_millis(10),
            DeadlineCompletion::new(AttemptId::new(1), tx),
        );

        assert_eq!(
            rx.recv().await,
            Some(SyncEvent::DeadlineFired {
                attempt: AttemptId::new(1)
            })
        );
    }

    #[tokio::test]
    async fn test_canceled_deadline_never_fires() {
        let (tx, mut rx) = event_queue();
        let mut deadlines = TokioDeadlines::new();

        let handle = deadlines.schedule_once(
            Duration::from_millis(20),
            DeadlineCompletion::new(AttemptId::new(1), tx.clone()),
        );
        deadlines.cancel(handle);
        assert_eq!(deadlines.pending(), 0);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(rx.try_recv(), None);
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        let (tx, mut rx) = event_queue();
        let mut deadlines = TokioDeadlines::new();

        let handle = deadlines.schedule_once(
            Duration::from_millis(1),
            DeadlineCompletion::new(AttemptId::new(7), tx),
        );
        assert!(rx.recv().await.is_some());

        // Already fired, then canceled twice.
        deadlines.cancel(handle);
        deadlines.cancel(handle);
        assert_eq!(deadlines.pending(), 0);
    }

    #[tokio::test]
    async fn test_handles_are_distinct() {
        let (tx, _rx) = event_queue();
        let mut deadlines = TokioDeadlines::new();

        let a = deadlines.schedule_once(
            Duration::from_secs(60),
            DeadlineCompletion::new(AttemptId::new(1), tx.clone()),
        );
        let b = deadlines.schedule_once(
            Duration::from_secs(60),
            DeadlineCompletion::new(AttemptId::new(2), tx),
        );

        assert_ne!(a, b);
        assert_eq!(deadlines.pending(), 2);
        deadlines.cancel(a);
        assert_eq!(deadlines.pending(), 1);
    }
}
