use std::cell::Cell;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use crate::platform::WorkScheduler;

struct RuntimeInner {
    scheduler: Arc<dyn WorkScheduler>,
    update_requested: Cell<bool>,
}

impl RuntimeInner {
    fn new(scheduler: Arc<dyn WorkScheduler>) -> Self {
        Self {
            scheduler,
            update_requested: Cell::new(false),
        }
    }

    fn request_work(&self) {
        self.scheduler.schedule_work();
    }

    fn request_update(&self) {
        self.update_requested.set(true);
        self.request_work();
    }
}

/// Owns the cross-cycle signal state shared between the renderer and the
/// hook setters it hands out. Cloning is cheap; all clones observe the same
/// flags.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new(scheduler: Arc<dyn WorkScheduler>) -> Self {
        Self {
            inner: Rc::new(RuntimeInner::new(scheduler)),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle(Rc::downgrade(&self.inner))
    }

    pub fn has_update_request(&self) -> bool {
        self.inner.update_requested.get()
    }

    pub(crate) fn take_update_request(&self) -> bool {
        self.inner.update_requested.replace(false)
    }
}

/// Weak handle to a [`Runtime`], safe to stash inside long-lived callbacks.
/// Every operation is a no-op once the runtime is gone.
#[derive(Clone)]
pub struct RuntimeHandle(Weak<RuntimeInner>);

impl RuntimeHandle {
    pub fn request_work(&self) {
        if let Some(inner) = self.0.upgrade() {
            inner.request_work();
        }
    }

    /// Flags that a state update wants a fresh render cycle and pokes the
    /// host scheduler. The renderer consumes the flag at the start of its
    /// next slice.
    pub fn request_update(&self) {
        if let Some(inner) = self.0.upgrade() {
            inner.request_update();
        }
    }

    pub fn has_update_request(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.update_requested.get())
            .unwrap_or(false)
    }
}

/// Scheduler that drops every request; useful when the caller drives the
/// renderer by hand.
#[derive(Default)]
pub struct DefaultScheduler;

impl WorkScheduler for DefaultScheduler {
    fn schedule_work(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingScheduler {
        calls: AtomicUsize,
    }

    impl WorkScheduler for CountingScheduler {
        fn schedule_work(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn update_request_is_consumed_once() {
        let runtime = Runtime::new(Arc::new(DefaultScheduler));
        runtime.handle().request_update();
        assert!(runtime.has_update_request());
        assert!(runtime.take_update_request());
        assert!(!runtime.take_update_request());
    }

    #[test]
    fn requests_poke_the_scheduler() {
        let scheduler = Arc::new(CountingScheduler::default());
        let runtime = Runtime::new(scheduler.clone());
        runtime.handle().request_work();
        runtime.handle().request_update();
        assert_eq!(scheduler.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn handle_outlives_runtime_harmlessly() {
        let handle = {
            let runtime = Runtime::new(Arc::new(DefaultScheduler));
            runtime.handle()
        };
        handle.request_update();
        assert!(!handle.has_update_request());
    }
}
