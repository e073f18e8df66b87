//! Clocks and rate limiting
//!
//! `Throttle` reads time from an injected [`Clock`] instead of owning
//! timers, so the caller decides when to poll and tests can drive
//! time by hand with [`ManualClock`].

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Source of wall-clock time in milliseconds since the Unix epoch
pub trait Clock {
    fn now_ms(&self) -> i64;
}

/// Real time via `chrono` (uses `Date.now()` under wasm)
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Hand-driven clock; clones share the same time
#[derive(Clone, Debug, Default)]
pub struct ManualClock(Arc<AtomicI64>);

impl ManualClock {
    pub fn at(ms: i64) -> Self {
        Self(Arc::new(AtomicI64::new(ms)))
    }

    pub fn set(&self, ms: i64) {
        self.0.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: i64) {
        self.0.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }
}

/// Leading-edge throttle with a trailing flush.
///
/// The first call runs immediately; calls inside the interval are recorded
/// as pending and run by a later [`flush`](Throttle::flush) once the
/// interval has passed.
pub struct Throttle<C: Clock> {
    clock: C,
    interval_ms: i64,
    last_run: Option<i64>,
    pending: bool,
}

impl<C: Clock> Throttle<C> {
    pub fn new(clock: C, interval_ms: i64) -> Self {
        Self {
            clock,
            interval_ms,
            last_run: None,
            pending: false,
        }
    }

    fn ready(&self, now: i64) -> bool {
        self.last_run
            .map_or(true, |last| now - last >= self.interval_ms)
    }

    /// Run `f` now if the interval allows, otherwise mark it pending.
    /// Returns whether `f` ran.
    pub fn call(&mut self, f: impl FnOnce()) -> bool {
        let now = self.clock.now_ms();
        if self.ready(now) {
            self.last_run = Some(now);
            self.pending = false;
            f();
            true
        } else {
            self.pending = true;
            false
        }
    }

    /// Run a pending call if the interval has elapsed
    pub fn flush(&mut self, f: impl FnOnce()) -> bool {
        if !self.pending {
            return false;
        }
        self.call(f)
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_throttle_runs_first_call_and_defers_the_rest() {
        let clock = ManualClock::at(0);
        let mut throttle = Throttle::new(clock.clone(), 100);
        let runs = Cell::new(0);

        assert!(throttle.call(|| runs.set(runs.get() + 1)));
        assert!(!throttle.call(|| runs.set(runs.get() + 1)));
        assert!(throttle.is_pending());

        clock.advance(50);
        assert!(!throttle.flush(|| runs.set(runs.get() + 1)));

        clock.advance(50);
        assert!(throttle.flush(|| runs.set(runs.get() + 1)));
        assert_eq!(runs.get(), 2);
        assert!(!throttle.flush(|| runs.set(runs.get() + 1)));
    }
}
