//! FG edge event gating

/// Suspend/resume control over the FG edge event source
///
/// The pulse counter is reset by the control loop while the edge event can
/// preempt it at any point. Resetting is only race-free while the event is
/// suspended, so every reset goes through this gate.
pub trait EdgeGate {
    /// Stop delivering edge events (mask the interrupt)
    fn suspend(&mut self);

    /// Resume delivering edge events (unmask the interrupt)
    fn resume(&mut self);
}

impl<T: EdgeGate + ?Sized> EdgeGate for &mut T {
    fn suspend(&mut self) {
        (**self).suspend()
    }

    fn resume(&mut self) {
        (**self).resume()
    }
}
