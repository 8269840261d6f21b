//! Monotonic time source

/// Monotonic clock with an idle hint for busy-poll loops
///
/// Every control loop calls [`Clock::idle`] once per iteration. On hardware
/// this is a short sleep or a spin hint; in simulation it advances time.
pub trait Clock {
    /// Microseconds since an arbitrary fixed origin
    fn now_us(&self) -> u64;

    /// Yield the CPU between loop iterations
    fn idle(&mut self);

    /// Microseconds elapsed since `since_us`
    fn elapsed_us(&self, since_us: u64) -> u64 {
        self.now_us().saturating_sub(since_us)
    }
}
