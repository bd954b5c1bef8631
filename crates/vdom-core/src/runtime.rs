use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use crate::platform::RuntimeScheduler;

pub(crate) type Task = Box<dyn FnOnce() + 'static>;

struct RuntimeInner {
    scheduler: Arc<dyn RuntimeScheduler>,
    render_requested: Cell<bool>,
    pending_tasks: RefCell<VecDeque<Task>>,
}

impl RuntimeInner {
    fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            scheduler,
            render_requested: Cell::new(false),
            pending_tasks: RefCell::new(VecDeque::new()),
        }
    }

    fn schedule(&self) {
        self.scheduler.schedule_flush();
    }

    fn request_render(&self) -> bool {
        if self.render_requested.replace(true) {
            return false;
        }
        self.schedule();
        true
    }

    fn take_render_request(&self) -> bool {
        self.render_requested.replace(false)
    }

    fn enqueue_task(&self, task: Task) {
        self.pending_tasks.borrow_mut().push_back(task);
        self.schedule();
    }

    fn drain_tasks(&self) -> usize {
        // Tasks queued while draining wait for the next drain.
        let tasks: Vec<Task> = {
            let mut pending = self.pending_tasks.borrow_mut();
            pending.drain(..).collect()
        };
        let count = tasks.len();
        for task in tasks {
            task();
        }
        count
    }

    fn has_tasks(&self) -> bool {
        !self.pending_tasks.borrow().is_empty()
    }
}

/// Microtask queue plus the coalescing render request flag.
///
/// This is the batching primitive the engine is driven by: `enqueue` defers a
/// task until the host drains the queue, and `request_render` behaves like a
/// render function wrapped so that any number of calls before the next drain
/// yield a single pass.
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

    pub fn is_render_requested(&self) -> bool {
        self.inner.render_requested.get()
    }

    pub fn has_pending_tasks(&self) -> bool {
        self.inner.has_tasks()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(Arc::new(DefaultScheduler))
    }
}

#[derive(Default)]
pub struct DefaultScheduler;

impl RuntimeScheduler for DefaultScheduler {
    fn schedule_flush(&self) {}
}

/// Weak handle to a [`Runtime`], safe to capture in setters and effects.
#[derive(Clone)]
pub struct RuntimeHandle(Weak<RuntimeInner>);

impl RuntimeHandle {
    /// Defers `task` until the next drain. Runs it immediately when the
    /// runtime is already gone.
    pub fn enqueue(&self, task: impl FnOnce() + 'static) {
        if let Some(inner) = self.0.upgrade() {
            inner.enqueue_task(Box::new(task));
        } else {
            task();
        }
    }

    /// Returns `true` when this call raised the flag, `false` when a render
    /// was already pending or the runtime is gone.
    pub fn request_render(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.request_render())
            .unwrap_or(false)
    }

    pub fn is_render_requested(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.render_requested.get())
            .unwrap_or(false)
    }

    pub(crate) fn take_render_request(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.take_render_request())
            .unwrap_or(false)
    }

    /// Runs every task queued so far and returns how many ran.
    pub fn drain_tasks(&self) -> usize {
        self.0
            .upgrade()
            .map(|inner| inner.drain_tasks())
            .unwrap_or(0)
    }

    pub fn has_pending_tasks(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.has_tasks())
            .unwrap_or(false)
    }
}
