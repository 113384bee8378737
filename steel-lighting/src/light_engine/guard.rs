//! Single-owner lock around the engine state.

use std::{
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    thread::{self, ThreadId},
};

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

/// A re-entrant lock that remembers which thread created it.
///
/// The engine is meant to be driven by one thread. Other threads may still
/// call in; they are serialized by the lock, but when such a call has to wait
/// the guard reports it, naming both threads. The report is an `error!` the
/// first time and a `debug!` afterwards.
pub struct ConcurrencyGuard<T> {
    inner: ReentrantMutex<T>,
    owner: ThreadId,
    owner_name: String,
    report_violations: bool,
    reported: AtomicBool,
    contended: AtomicUsize,
}

impl<T> ConcurrencyGuard<T> {
    /// Wraps `value`, recording the calling thread as owner.
    pub fn new(value: T, report_violations: bool) -> Self {
        let owner = thread::current();
        Self {
            inner: ReentrantMutex::new(value),
            owner: owner.id(),
            owner_name: owner.name().unwrap_or("<unnamed>").to_owned(),
            report_violations,
            reported: AtomicBool::new(false),
            contended: AtomicUsize::new(0),
        }
    }

    /// Acquires the lock, blocking if another thread holds it.
    pub fn lock(&self) -> ReentrantMutexGuard<'_, T> {
        if let Some(guard) = self.inner.try_lock() {
            return guard;
        }

        let current = thread::current();
        if self.report_violations && current.id() != self.owner {
            let current_name = current.name().unwrap_or("<unnamed>");
            if self.reported.swap(true, Ordering::Relaxed) {
                log::debug!(
                    "Lighting engine accessed from thread {current_name} ({:?}) while busy, owner is {} ({:?})",
                    current.id(),
                    self.owner_name,
                    self.owner
                );
            } else {
                log::error!(
                    "Illegal lighting engine access from thread {current_name} ({:?}), the engine is owned by {} ({:?}); blocking until it is free",
                    current.id(),
                    self.owner_name,
                    self.owner
                );
            }
        }

        self.contended.fetch_add(1, Ordering::Release);
        self.inner.lock()
    }

    /// The thread that created the guard.
    #[must_use]
    pub fn owner(&self) -> ThreadId {
        self.owner
    }

    /// Whether a cross-thread access has been reported.
    #[must_use]
    pub fn violation_reported(&self) -> bool {
        self.reported.load(Ordering::Relaxed)
    }

    /// How many lock calls had to wait for another thread.
    #[must_use]
    pub fn contended_count(&self) -> usize {
        self.contended.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::Cell,
        sync::Arc,
        time::{Duration, Instant},
    };

    use super::*;

    #[test]
    fn test_reentrant_on_owner() {
        let guard = ConcurrencyGuard::new(Cell::new(1), true);
        let outer = guard.lock();
        let inner = guard.lock();
        inner.set(2);
        assert_eq!(outer.get(), 2);
        assert_eq!(guard.contended_count(), 0);
        assert_eq!(guard.owner(), thread::current().id());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_foreign_thread_is_reported_then_served() {
        let guard = Arc::new(ConcurrencyGuard::new(Cell::new(0u32), true));
        let held = guard.lock();

        let worker = {
            let guard = Arc::clone(&guard);
            thread::Builder::new()
                .name("foreign".to_owned())
                .spawn(move || {
                    let state = guard.lock();
                    state.set(state.get() + 1);
                })
                .unwrap()
        };

        let deadline = Instant::now() + Duration::from_secs(10);
        while guard.contended_count() == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(guard.contended_count(), 1);
        assert!(guard.violation_reported());
        assert_eq!(held.get(), 0);

        drop(held);
        worker.join().unwrap();
        assert_eq!(guard.lock().get(), 1);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_reporting_disabled() {
        let guard = Arc::new(ConcurrencyGuard::new(Cell::new(0u32), false));
        let held = guard.lock();
        let worker = {
            let guard = Arc::clone(&guard);
            thread::spawn(move || drop(guard.lock()))
        };
        let deadline = Instant::now() + Duration::from_secs(10);
        while guard.contended_count() == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        drop(held);
        worker.join().unwrap();
        assert!(!guard.violation_reported());
    }
}
