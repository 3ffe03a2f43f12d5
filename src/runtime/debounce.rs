use super::Instant;
use std::time::Duration;

/// Reset-not-queue timer owned by a single field.
///
/// Every `schedule` supersedes the pending value and restarts the quiet
/// interval; only the last value of a burst is ever released.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<Pending<T>>,
    version: u64,
}

#[derive(Debug, Clone)]
struct Pending<T> {
    due_at: Instant,
    version: u64,
    value: T,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            version: 0,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    /// Number of schedules so far, bumped on cancel too.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn schedule(&mut self, value: T, now: Instant) {
        self.version = self.version.saturating_add(1);
        self.pending = Some(Pending {
            due_at: now + self.delay,
            version: self.version,
            value,
        });
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.version = self.version.saturating_add(1);
        self.pending.take().map(|pending| pending.value)
    }

    /// Releases the pending value immediately, regardless of the timer.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|pending| pending.value)
    }

    /// Releases the pending value once its quiet interval has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.due_at <= now && pending.version == self.version);
        if due { self.flush() } else { None }
    }

    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|pending| pending.due_at.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::Debouncer;
    use crate::runtime::Instant;
    use proptest::prelude::*;
    use std::time::Duration;

    const DELAY: Duration = Duration::from_millis(300);

    #[test]
    fn schedule_resets_the_timer() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.schedule("a", start);
        debouncer.schedule("b", start + Duration::from_millis(200));

        assert_eq!(debouncer.poll(start + Duration::from_millis(350)), None);
        assert_eq!(debouncer.poll(start + Duration::from_millis(500)), Some("b"));
        assert_eq!(debouncer.poll(start + Duration::from_millis(900)), None);
    }

    #[test]
    fn cancel_drops_pending_value() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.schedule(1, start);
        assert_eq!(debouncer.cancel(), Some(1));
        assert_eq!(debouncer.poll(start + DELAY), None);
    }

    #[test]
    fn flush_ignores_timer() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.schedule(7, start);
        assert_eq!(debouncer.flush(), Some(7));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn time_until_due_counts_down() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        assert_eq!(debouncer.time_until_due(start), None);
        debouncer.schedule((), start);
        assert_eq!(
            debouncer.time_until_due(start + Duration::from_millis(100)),
            Some(Duration::from_millis(200))
        );
    }

    proptest! {
        #[test]
        fn burst_releases_exactly_the_last_value(gaps in proptest::collection::vec(0u64..300, 1..20)) {
            let start = Instant::now();
            let mut debouncer = Debouncer::new(DELAY);
            let mut now = start;
            let mut released = Vec::new();
            for (idx, gap) in gaps.iter().enumerate() {
                now += Duration::from_millis(*gap);
                released.extend(debouncer.poll(now));
                debouncer.schedule(idx, now);
            }
            released.extend(debouncer.poll(now + DELAY));
            prop_assert_eq!(released, vec![gaps.len() - 1]);
        }
    }
}
