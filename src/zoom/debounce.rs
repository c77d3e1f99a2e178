use crate::config::DebounceConfig;
use std::time::{Duration, Instant};

/// Single-slot leading + trailing debounce, driven by an external clock.
///
/// The first submission arms an initial timer and a trailing timer. A submission while
/// either is armed disarms both and re-arms the trailing timer only. Whichever timer
/// fires first hands out the latest pending item; the other finds the slot empty.
#[derive(Debug)]
pub struct Debouncer<T> {
    initial_delay: Duration,
    delay: Duration,
    pending: Option<T>,
    initial_deadline: Option<Instant>,
    trailing_deadline: Option<Instant>,
}

impl<T> Debouncer<T> {
    pub fn new(initial_delay: Duration, delay: Duration) -> Self {
        Self {
            initial_delay,
            delay,
            pending: None,
            initial_deadline: None,
            trailing_deadline: None,
        }
    }

    pub fn from_config(config: &DebounceConfig) -> Self {
        Self::new(config.initial_delay(), config.delay())
    }

    pub fn submit(&mut self, now: Instant, item: T) {
        if self.is_active() {
            self.initial_deadline = None;
        } else {
            self.initial_deadline = Some(now + self.initial_delay);
        }
        self.trailing_deadline = Some(now + self.delay);
        self.pending = Some(item);
    }

    /// Returns the pending item when a timer has fired by `now`.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let mut fired = None;
        if self.initial_deadline.is_some_and(|d| now >= d) {
            self.initial_deadline = None;
            fired = self.pending.take();
        }
        if self.trailing_deadline.is_some_and(|d| now >= d) {
            self.trailing_deadline = None;
            if fired.is_none() {
                fired = self.pending.take();
            }
        }
        fired
    }

    pub fn is_active(&self) -> bool {
        self.initial_deadline.is_some() || self.trailing_deadline.is_some()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.initial_deadline, self.trailing_deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}
