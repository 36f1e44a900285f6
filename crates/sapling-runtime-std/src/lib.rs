//! Standard runtime services backed by Rust's `std` library.
//!
//! This crate provides a concrete [`RuntimeScheduler`] for hosts that poll for
//! work from an event loop. Applications construct a [`StdRuntime`] and hand its
//! runtime to [`sapling_core::Root::with_runtime`].

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use sapling_core::{Runtime, RuntimeHandle, RuntimeScheduler};

type TurnWaker = Arc<dyn Fn() + Send + Sync + 'static>;

/// Scheduler that records turn requests in an atomic flag and optionally wakes
/// the host loop.
pub struct StdScheduler {
    turn_requested: AtomicBool,
    turn_waker: RwLock<Option<TurnWaker>>,
}

impl StdScheduler {
    pub fn new() -> Self {
        Self {
            turn_requested: AtomicBool::new(false),
            turn_waker: RwLock::new(None),
        }
    }

    /// Returns whether a turn has been requested since the last call.
    pub fn take_turn_request(&self) -> bool {
        self.turn_requested.swap(false, Ordering::SeqCst)
    }

    /// Registers a waker that will be invoked whenever a new turn is scheduled.
    pub fn set_turn_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        *self
            .turn_waker
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(waker));
    }

    /// Clears any registered turn waker.
    pub fn clear_turn_waker(&self) {
        *self
            .turn_waker
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn wake(&self) {
        let waker = self
            .turn_waker
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(waker) = waker {
            waker();
        }
    }
}

impl Default for StdScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdScheduler")
            .field("turn_requested", &self.turn_requested.load(Ordering::SeqCst))
            .finish()
    }
}

impl RuntimeScheduler for StdScheduler {
    fn schedule_turn(&self) {
        self.turn_requested.store(true, Ordering::SeqCst);
        self.wake();
    }
}

/// Convenience container bundling the standard scheduler with a runtime.
#[derive(Clone)]
pub struct StdRuntime {
    scheduler: Arc<StdScheduler>,
    runtime: Runtime,
}

impl StdRuntime {
    pub fn new() -> Self {
        let scheduler = Arc::new(StdScheduler::default());
        let runtime = Runtime::new(scheduler.clone());
        Self { scheduler, runtime }
    }

    /// Returns a [`sapling_core::Runtime`] configured with the standard scheduler.
    pub fn runtime(&self) -> Runtime {
        self.runtime.clone()
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn scheduler(&self) -> Arc<StdScheduler> {
        Arc::clone(&self.scheduler)
    }

    /// Returns whether a turn was requested since the last poll.
    pub fn take_turn_request(&self) -> bool {
        self.scheduler.take_turn_request()
    }

    pub fn set_turn_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        self.scheduler.set_turn_waker(waker);
    }

    pub fn clear_turn_waker(&self) {
        self.scheduler.clear_turn_waker();
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

impl Default for StdRuntime {
    fn default() -> Self {
        Self::new()
    }
}
