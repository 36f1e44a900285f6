//! Platform abstraction for the Sapling runtime.
//!
//! The runtime never runs deferred work on its own. It tells the host that a
//! turn is due through [`RuntimeScheduler`], and the host later drives the turn
//! on the runtime's thread.

/// Notifies the host that queued work is waiting for the next turn.
///
/// Implementations must be safe to share with other threads, since hosts
/// commonly wake an event loop from wherever the notification lands.
pub trait RuntimeScheduler: Send + Sync {
    /// Request that the host run a turn soon.
    fn schedule_turn(&self);
}
