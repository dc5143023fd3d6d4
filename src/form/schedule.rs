//! Trailing-edge debounce driven by an injectable clock.
//!
//! Nothing here spawns timers. The embedding event loop asks for
//! [`Debouncer::next_deadline`], sleeps, and then polls.

use std::{
    cell::Cell,
    fmt,
    rc::Rc,
    time::{Duration, Instant},
};

pub const DEFAULT_NOTIFY_DEBOUNCE: Duration = Duration::from_millis(10);

pub trait Clock: fmt::Debug {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// Holds at most one pending item. Scheduling again replaces the item and
/// pushes the deadline out; the deadline never moves earlier.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn schedule_at(&mut self, item: T, now: Instant) {
        let candidate = now + self.delay;
        let fire_at = self
            .pending
            .as_ref()
            .map(|(existing, _)| (*existing).max(candidate))
            .unwrap_or(candidate);
        self.pending = Some((fire_at, item));
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(fire_at, _)| *fire_at)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn peek(&self) -> Option<&T> {
        self.pending.as_ref().map(|(_, item)| item)
    }

    /// Takes the pending item if its deadline has passed at `now`.
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        match self.pending {
            Some((fire_at, _)) if fire_at <= now => self.take(),
            _ => None,
        }
    }

    /// Takes the pending item regardless of its deadline.
    pub fn take(&mut self) -> Option<T> {
        self.pending.take().map(|(_, item)| item)
    }

    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_only_after_delay() {
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        let base = Instant::now();
        debouncer.schedule_at("a", base);
        assert_eq!(debouncer.take_due(base + Duration::from_millis(9)), None);
        assert_eq!(debouncer.take_due(base + Duration::from_millis(10)), Some("a"));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn reschedule_keeps_last_item_and_extends_deadline() {
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        let base = Instant::now();
        debouncer.schedule_at(1, base);
        debouncer.schedule_at(2, base + Duration::from_millis(5));
        assert_eq!(
            debouncer.next_deadline(),
            Some(base + Duration::from_millis(15))
        );
        assert_eq!(debouncer.take_due(base + Duration::from_millis(12)), None);
        assert_eq!(debouncer.take_due(base + Duration::from_millis(15)), Some(2));
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let other = clock.clone();
        let start = other.now();
        clock.advance(Duration::from_millis(25));
        assert_eq!(other.now(), start + Duration::from_millis(25));
    }
}
