//! Mutual exclusion for the shared event queue.
//!
//! The machine does not depend on a specific concurrency runtime. It is
//! generic over a [`Lock`], picked at construction:
//! - [`BlockingLock`] for machines fed by producers on other threads
//! - [`NoopLock`] for single-threaded embeddings

use parking_lot::Mutex;
use std::cell::RefCell;

/// Lock/unlock around a closure.
///
/// Acquisition waits as long as it takes; there is no timeout at this layer.
/// Callers needing a bounded wait wrap their own primitive in this trait.
pub trait Lock<T> {
    fn new(value: T) -> Self;

    /// Run `f` with exclusive access to the protected value.
    fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R;
}

/// Blocking lock backed by `parking_lot::Mutex`.
#[derive(Debug, Default)]
pub struct BlockingLock<T>(Mutex<T>);

impl<T> Lock<T> for BlockingLock<T> {
    fn new(value: T) -> Self {
        BlockingLock(Mutex::new(value))
    }

    fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.0.lock();
        f(&mut *guard)
    }
}

/// Lock that performs no synchronization.
///
/// It is not `Sync`, so producers of a machine using it cannot leave the
/// consumer's thread.
#[derive(Debug, Default)]
pub struct NoopLock<T>(RefCell<T>);

impl<T> Lock<T> for NoopLock<T> {
    fn new(value: T) -> Self {
        NoopLock(RefCell::new(value))
    }

    fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut value = self.0.borrow_mut();
        f(&mut *value)
    }
}
