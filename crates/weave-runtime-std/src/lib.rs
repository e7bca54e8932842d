//! Standard runtime services backed by Rust's `std` library.
//!
//! This crate provides concrete implementations of the platform abstraction
//! traits defined in `weave-core`. Applications construct a [`StdServices`]
//! bundle and drive the renderer from their own loop: poll
//! [`StdServices::take_work_request`], and when it reports pending work run
//! a slice against a [`TimeSliceDeadline`].

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use weave_core::{Deadline, Runtime, RuntimeHandle, WorkScheduler};

/// Scheduler that records work requests in a flag and optionally wakes a
/// blocked driver thread.
pub struct StdScheduler {
    work_requested: AtomicBool,
    waker: RwLock<Option<Arc<dyn Fn() + Send + Sync + 'static>>>,
}

impl StdScheduler {
    pub fn new() -> Self {
        Self {
            work_requested: AtomicBool::new(false),
            waker: RwLock::new(None),
        }
    }

    /// Returns whether a work slice has been requested since the last call.
    pub fn take_work_request(&self) -> bool {
        self.work_requested.swap(false, Ordering::SeqCst)
    }

    /// Registers a waker invoked whenever new work is scheduled.
    pub fn set_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        *self.waker.write().unwrap() = Some(Arc::new(waker));
    }

    /// Clears any registered waker.
    pub fn clear_waker(&self) {
        *self.waker.write().unwrap() = None;
    }

    fn wake(&self) {
        let waker = self.waker.read().unwrap().clone();
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
            .field(
                "work_requested",
                &self.work_requested.load(Ordering::SeqCst),
            )
            .finish()
    }
}

impl WorkScheduler for StdScheduler {
    fn schedule_work(&self) {
        self.work_requested.store(true, Ordering::SeqCst);
        self.wake();
    }
}

/// Deadline that yields once a wall-clock budget has elapsed.
pub struct TimeSliceDeadline {
    started: Instant,
    budget: Duration,
}

impl TimeSliceDeadline {
    /// Starts the slice clock immediately.
    pub fn new(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Deadline for TimeSliceDeadline {
    fn should_yield(&self) -> bool {
        self.started.elapsed() >= self.budget
    }
}

/// Convenience container bundling the standard scheduler with a runtime.
#[derive(Clone)]
pub struct StdServices {
    scheduler: Arc<StdScheduler>,
    runtime: Runtime,
}

impl StdServices {
    pub fn new() -> Self {
        let scheduler = Arc::new(StdScheduler::default());
        let runtime = Runtime::new(scheduler.clone());
        Self { scheduler, runtime }
    }

    /// Returns a [`weave_core::Runtime`] configured with the standard
    /// scheduler, for [`weave_core::Renderer::with_runtime`].
    pub fn runtime(&self) -> Runtime {
        self.runtime.clone()
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn scheduler(&self) -> Arc<StdScheduler> {
        Arc::clone(&self.scheduler)
    }

    /// Returns whether work was requested since the last poll.
    pub fn take_work_request(&self) -> bool {
        self.scheduler.take_work_request()
    }

    /// Registers a waker to be called when the renderer schedules work.
    pub fn set_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        self.scheduler.set_waker(waker);
    }

    /// Starts a fresh slice deadline with the given budget.
    pub fn deadline(&self, budget: Duration) -> TimeSliceDeadline {
        TimeSliceDeadline::new(budget)
    }
}

impl Default for StdServices {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn work_requests_latch_until_polled() {
        let scheduler = StdScheduler::new();
        assert!(!scheduler.take_work_request());
        scheduler.schedule_work();
        scheduler.schedule_work();
        assert!(scheduler.take_work_request());
        assert!(!scheduler.take_work_request());
    }

    #[test]
    fn waker_fires_on_schedule() {
        let scheduler = StdScheduler::new();
        let wakes = Arc::new(AtomicUsize::new(0));
        let observed = Arc::clone(&wakes);
        scheduler.set_waker(move || {
            observed.fetch_add(1, Ordering::SeqCst);
        });
        scheduler.schedule_work();
        assert_eq!(wakes.load(Ordering::SeqCst), 1);
        scheduler.clear_waker();
        scheduler.schedule_work();
        assert_eq!(wakes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn zero_budget_deadline_yields_immediately() {
        let deadline = TimeSliceDeadline::new(Duration::ZERO);
        assert!(deadline.should_yield());
    }

    #[test]
    fn services_route_requests_through_the_runtime() {
        let services = StdServices::new();
        assert!(!services.take_work_request());
        services.runtime_handle().request_work();
        assert!(services.take_work_request());
    }
}
