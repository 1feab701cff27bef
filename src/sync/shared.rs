//! Shared time state.
//!
//! The last synchronized time is written by exactly one [`TimePublisher`]
//! (owned by the state machine) and read by any number of [`TimeReader`]s
//! from any thread. Both sides go through one mutex that is held only for
//! the copy in or out; nothing blocking ever happens under it.
//!
//! The mutex can also guard a consumer-supplied resource `R` (a frame
//! buffer, an LED strip) so a consumer can read the time and touch that
//! resource as one consistent step with [`TimeReader::with_resource`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::core::EpochSeconds;

/// A consistent copy of the shared time state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeSnapshot {
    /// Last synchronized time, or [`EpochSeconds::UNKNOWN`].
    pub epoch: EpochSeconds,
    /// Monotonic instant at which `epoch` was published.
    pub synced_at: Option<Instant>,
    /// Number of publishes so far.
    pub generation: u64,
}

impl TimeSnapshot {
    /// Whether at least one synchronization has succeeded.
    pub fn is_synchronized(&self) -> bool {
        self.generation > 0
    }

    /// Time since the last publish, if any.
    pub fn age(&self, now: Instant) -> Option<Duration> {
        self.synced_at.map(|at| now.saturating_duration_since(at))
    }

    /// Last synchronized time advanced by the monotonic time elapsed since.
    pub fn estimate(&self, now: Instant) -> Option<EpochSeconds> {
        self.age(now).map(|age| self.epoch.advanced_by(age))
    }
}

#[derive(Debug)]
struct Inner<R> {
    snapshot: TimeSnapshot,
    resource: R,
}

/// Create a shared time state with no attached resource.
pub fn shared_time() -> (TimePublisher<()>, TimeReader<()>) {
    shared_time_with(())
}

/// Create a shared time state that also guards `resource`.
pub fn shared_time_with<R>(resource: R) -> (TimePublisher<R>, TimeReader<R>) {
    let inner = Arc::new(Mutex::new(Inner {
        snapshot: TimeSnapshot::default(),
        resource,
    }));
    (
        TimePublisher {
            inner: Arc::clone(&inner),
        },
        TimeReader { inner },
    )
}

/// The single writer of the shared time state.
///
/// Not `Clone`: whoever owns it is the only context that can publish.
#[derive(Debug)]
pub struct TimePublisher<R = ()> {
    inner: Arc<Mutex<Inner<R>>>,
}

impl<R> TimePublisher<R> {
    /// Overwrite the stored time.
    pub fn publish(&mut self, epoch: EpochSeconds, at: Instant) {
        let mut inner = self.inner.lock();
        inner.snapshot = TimeSnapshot {
            epoch,
            synced_at: Some(at),
            generation: inner.snapshot.generation.wrapping_add(1),
        };
    }

    /// Create another reader for the same state.
    pub fn reader(&self) -> TimeReader<R> {
        TimeReader {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Read-only handle to the shared time state.
#[derive(Debug)]
pub struct TimeReader<R = ()> {
    inner: Arc<Mutex<Inner<R>>>,
}

impl<R> Clone for TimeReader<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R> TimeReader<R> {
    /// Last published time, or [`EpochSeconds::UNKNOWN`].
    pub fn read(&self) -> EpochSeconds {
        self.inner.lock().snapshot.epoch
    }

    /// Copy of the full state.
    pub fn snapshot(&self) -> TimeSnapshot {
        self.inner.lock().snapshot
    }

    /// Current time extrapolated from the last publish.
    ///
    /// `None` until the first successful synchronization.
    pub fn estimate(&self, now: Instant) -> Option<EpochSeconds> {
        self.snapshot().estimate(now)
    }

    /// Run `f` on the snapshot and the guarded resource under one lock.
    ///
    /// `f` must not block; publishes wait for it to return.
    pub fn with_resource<T>(&self, f: impl FnOnce(&TimeSnapshot, &mut R) -> T) -> T {
        let mut guard = self.inner.lock();
        let Inner { snapshot, resource } = &mut *guard;
        f(snapshot, resource)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    use super::*;

    #[test]
    fn test_unknown_before_first_publish() {
        let (_publisher, reader) = shared_time();
        assert!(reader.read().is_unknown());

        let snapshot = reader.snapshot();
        assert!(!snapshot.is_synchronized());
        assert_eq!(snapshot.synced_at, None);
        assert_eq!(reader.estimate(Instant::now()), None);
    }

    #[test]
    fn test_publish_then_read() {
        let (mut publisher, reader) = shared_time();
        let at = Instant::now();

        publisher.publish(EpochSeconds::from_secs(1_704_067_200), at);

        assert_eq!(reader.read(), EpochSeconds::from_secs(1_704_067_200));
        let snapshot = reader.snapshot();
        assert_eq!(snapshot.generation, 1);
        assert_eq!(snapshot.synced_at, Some(at));
    }

    #[test]
    fn test_later_publish_may_go_backwards() {
        let (mut publisher, reader) = shared_time();
        let at = Instant::now();

        publisher.publish(EpochSeconds::from_secs(2_000), at);
        publisher.publish(EpochSeconds::from_secs(1_000), at);

        assert_eq!(reader.read(), EpochSeconds::from_secs(1_000));
        assert_eq!(reader.snapshot().generation, 2);
    }

    #[test]
    fn test_estimate_advances_with_monotonic_time() {
        let (mut publisher, reader) = shared_time();
        let at = Instant::now();
        publisher.publish(EpochSeconds::from_secs(1_000), at);

        let later = at + Duration::from_millis(3_500);
        assert_eq!(reader.estimate(later), Some(EpochSeconds::from_secs(1_003)));
        // An instant before the publish does not rewind the estimate.
        assert_eq!(
            reader.snapshot().estimate(at),
            Some(EpochSeconds::from_secs(1_000))
        );
    }

    #[test]
    fn test_publisher_reader_shares_state() {
        let (mut publisher, _) = shared_time();
        let reader = publisher.reader();
        publisher.publish(EpochSeconds::from_secs(5), Instant::now());
        assert_eq!(reader.read(), EpochSeconds::from_secs(5));
    }

    #[test]
    fn test_with_resource_sees_time_and_resource_together() {
        let (mut publisher, reader) = shared_time_with(Vec::<i64>::new());
        publisher.publish(EpochSeconds::from_secs(60), Instant::now());

        let rendered = reader.with_resource(|snapshot, frame| {
            frame.push(snapshot.epoch.as_secs());
            frame.len()
        });

        assert_eq!(rendered, 1);
        assert_eq!(reader.with_resource(|_, frame| frame.clone()), vec![60]);
    }

    #[test]
    fn test_concurrent_readers_never_see_partial_publish() {
        const READERS: usize = 16;
        const PUBLISHES: u64 = 20_000;

        // Every publish keeps epoch == generation * 1000; a torn read breaks it.
        // The guarded resource records the last epoch each consumer rendered.
        let (mut publisher, reader) = shared_time_with(0i64);
        let done = Arc::new(AtomicBool::new(false));

        let handles: Vec<_> = (0..READERS)
            .map(|_| {
                let reader = reader.clone();
                let done = Arc::clone(&done);
                thread::spawn(move || {
                    let mut observed = 0u64;
                    let mut last_generation = 0u64;
                    loop {
                        let finished = done.load(Ordering::Acquire);

                        let snapshot = reader.snapshot();
                        assert_eq!(snapshot.epoch.as_secs(), snapshot.generation as i64 * 1000);
                        assert!(snapshot.generation >= last_generation);
                        last_generation = snapshot.generation;

                        reader.with_resource(|snapshot, rendered| {
                            assert!(snapshot.epoch.as_secs() >= *rendered);
                            *rendered = snapshot.epoch.as_secs();
                        });
                        observed += 1;

                        if finished {
                            break observed;
                        }
                    }
                })
            })
            .collect();

        let at = Instant::now();
        for generation in 1..=PUBLISHES {
            publisher.publish(EpochSeconds::from_secs(generation as i64 * 1000), at);
        }
        done.store(true, Ordering::Release);

        for handle in handles {
            assert!(handle.join().unwrap() > 0);
        }
        assert_eq!(reader.read(), EpochSeconds::from_secs(PUBLISHES as i64 * 1000));
        assert_eq!(reader.snapshot().generation, PUBLISHES);
    }
}
