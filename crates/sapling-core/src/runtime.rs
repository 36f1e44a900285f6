use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use crate::platform::RuntimeScheduler;
use crate::root::RootSession;

/// Deferred work, run in enqueue order by the next turn.
pub(crate) enum Task {
    Callback(Box<dyn FnOnce() + 'static>),
    Rerender,
}

struct RuntimeInner {
    scheduler: Arc<dyn RuntimeScheduler>,
    rerender_pending: Cell<bool>,
    tasks: RefCell<VecDeque<Task>>,
    session: RefCell<Option<RootSession>>,
}

impl RuntimeInner {
    fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            scheduler,
            rerender_pending: Cell::new(false),
            tasks: RefCell::new(VecDeque::new()),
            session: RefCell::new(None),
        }
    }

    fn enqueue(&self, task: Task) {
        self.tasks.borrow_mut().push_back(task);
        self.scheduler.schedule_turn();
    }

    fn request_rerender(&self) -> bool {
        if self.rerender_pending.get() || self.session.borrow().is_none() {
            return false;
        }
        self.rerender_pending.set(true);
        log::trace!("re-render scheduled");
        self.enqueue(Task::Rerender);
        true
    }

    fn has_tasks(&self) -> bool {
        !self.tasks.borrow().is_empty()
    }
}

/// Owner of the task queue, the re-render flag and the root session.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            inner: Rc::new(RuntimeInner::new(scheduler)),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle(Rc::downgrade(&self.inner))
    }

    pub fn has_pending_tasks(&self) -> bool {
        self.inner.has_tasks()
    }

    pub fn is_rerender_pending(&self) -> bool {
        self.inner.rerender_pending.get()
    }

    pub fn session(&self) -> Option<RootSession> {
        self.inner.session.borrow().clone()
    }

    pub(crate) fn set_session(&self, session: RootSession) {
        *self.inner.session.borrow_mut() = Some(session);
    }

    /// Takes everything queued so far. Work queued while these tasks run belongs
    /// to the following turn.
    pub(crate) fn take_turn(&self) -> Vec<Task> {
        self.inner.tasks.borrow_mut().drain(..).collect()
    }

    pub(crate) fn finish_rerender(&self) {
        self.inner.rerender_pending.set(false);
    }
}

#[derive(Default)]
pub struct DefaultScheduler;

impl RuntimeScheduler for DefaultScheduler {
    fn schedule_turn(&self) {}
}

#[cfg(test)]
#[derive(Default)]
pub struct TestScheduler {
    requests: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl TestScheduler {
    pub fn requests(&self) -> usize {
        self.requests.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl RuntimeScheduler for TestScheduler {
    fn schedule_turn(&self) {
        self.requests
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}

/// Weak handle to a [`Runtime`]; inert once the runtime is dropped.
#[derive(Clone)]
pub struct RuntimeHandle(Weak<RuntimeInner>);

impl RuntimeHandle {
    /// Asks for one future render pass of the root session.
    ///
    /// Returns `false` when nothing was enqueued: a pass is already pending, no
    /// session has been rendered yet, or the runtime is gone.
    pub fn request_rerender(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.request_rerender())
            .unwrap_or(false)
    }

    /// Queues `task` behind everything already waiting for the next turn.
    pub fn spawn_task(&self, task: impl FnOnce() + 'static) {
        match self.0.upgrade() {
            Some(inner) => inner.enqueue(Task::Callback(Box::new(task))),
            None => log::trace!("runtime dropped; task discarded"),
        }
    }

    pub fn has_pending_tasks(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.has_tasks())
            .unwrap_or(false)
    }

    pub fn is_rerender_pending(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.rerender_pending.get())
            .unwrap_or(false)
    }
}
