//! Pulse counter shared between the edge event and the control loop
//!
//! Single producer (the edge event, increment only) and single consumer
//! (the control loop, read and reset). Increments are monotonic, so plain
//! reads need no protection. Resets are composed with suspending the edge
//! source through an [`EdgeGate`], which closes the window where an edge
//! lands between capturing the count and zeroing it.
//!
//! ```ignore
//! static FG_PULSES: PulseCounter = PulseCounter::new();
//!
//! // Edge interrupt / task:
//! FG_PULSES.increment();
//!
//! // Control loop:
//! let seen = FG_PULSES.read_and_reset(&mut gate);
//! ```

use portable_atomic::{AtomicU32, Ordering};

use crate::traits::EdgeGate;

/// Unsigned, direction-less FG pulse count
#[derive(Debug, Default)]
pub struct PulseCounter {
    pulses: AtomicU32,
}

impl PulseCounter {
    /// Create a counter at zero (usable in a `static`)
    pub const fn new() -> Self {
        Self {
            pulses: AtomicU32::new(0),
        }
    }

    /// Count one qualifying edge
    ///
    /// Edge context only. No debouncing.
    #[inline]
    pub fn increment(&self) {
        self.pulses.fetch_add(1, Ordering::Relaxed);
    }

    /// Current count
    ///
    /// A stale read only delays detection by one loop iteration.
    #[inline]
    pub fn count(&self) -> u32 {
        self.pulses.load(Ordering::Acquire)
    }

    /// Capture the count and reset it to zero
    ///
    /// Control context only. The edge source is suspended for the duration
    /// of the capture-and-zero so no edge is lost or counted twice.
    pub fn read_and_reset<G: EdgeGate + ?Sized>(&self, gate: &mut G) -> u32 {
        gate.suspend();
        let seen = self.pulses.load(Ordering::Acquire);
        self.pulses.store(0, Ordering::Release);
        gate.resume();
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingGate {
        suspended: bool,
        suspends: u32,
        resumes: u32,
    }

    impl EdgeGate for CountingGate {
        fn suspend(&mut self) {
            assert!(!self.suspended, "nested suspend");
            self.suspended = true;
            self.suspends += 1;
        }

        fn resume(&mut self) {
            assert!(self.suspended, "resume without suspend");
            self.suspended = false;
            self.resumes += 1;
        }
    }

    #[test]
    fn test_starts_at_zero() {
        let counter = PulseCounter::new();
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn test_increment_counts_every_edge() {
        let counter = PulseCounter::new();
        for _ in 0..321 {
            counter.increment();
        }
        assert_eq!(counter.count(), 321);
    }

    #[test]
    fn test_read_and_reset_returns_count() {
        let counter = PulseCounter::new();
        let mut gate = CountingGate::default();

        counter.increment();
        counter.increment();
        counter.increment();

        assert_eq!(counter.read_and_reset(&mut gate), 3);
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn test_second_reset_without_edges_is_zero() {
        let counter = PulseCounter::new();
        let mut gate = CountingGate::default();

        for _ in 0..10 {
            counter.increment();
        }

        assert_eq!(counter.read_and_reset(&mut gate), 10);
        assert_eq!(counter.read_and_reset(&mut gate), 0);
    }

    #[test]
    fn test_reset_is_gated() {
        let counter = PulseCounter::new();
        let mut gate = CountingGate::default();

        counter.read_and_reset(&mut gate);
        counter.read_and_reset(&mut gate);

        assert_eq!(gate.suspends, 2);
        assert_eq!(gate.resumes, 2);
        assert!(!gate.suspended);
    }

    #[test]
    fn test_counting_resumes_after_reset() {
        let counter = PulseCounter::new();
        let mut gate = CountingGate::default();

        counter.increment();
        counter.read_and_reset(&mut gate);
        counter.increment();
        counter.increment();

        assert_eq!(counter.count(), 2);
    }
}
