//! Platform abstraction for the render runtime.
//!
//! The engine never blocks or spins an event loop of its own. Whenever work
//! is queued (a render request or a deferred effect body) the runtime tells
//! the host through a [`RuntimeScheduler`], and the host drains the queue at
//! its next microtask-equivalent opportunity.

/// Receives notifications that the runtime has pending work.
///
/// Implementations must be safe to share between threads so hosts can wake
/// an event loop from anywhere, even though draining itself happens on the
/// thread that owns the [`crate::Root`].
pub trait RuntimeScheduler: Send + Sync {
    /// Request that the host drain pending runtime work soon.
    fn schedule_flush(&self);
}
