//! Lock identities and the monitor container.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};

use crate::container::Container;

static NEXT_ORDER_KEY: AtomicU64 = AtomicU64::new(1);

/// An opaque token used purely for mutual exclusion.
///
/// Clones refer to the same monitor. Two `LockId`s are equal only if they are
/// clones of each other. The monitor is reentrant: a thread already holding it
/// (e.g. through [`OrderedLock`](crate::OrderedLock)) may enter it again.
#[derive(Clone)]
pub struct LockId {
    inner: Arc<LockInner>,
}

struct LockInner {
    order_key: u64,
    monitor: ReentrantMutex<()>,
}

impl LockId {
    pub fn new() -> Self {
        Self::with_order_key(NEXT_ORDER_KEY.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn with_order_key(order_key: u64) -> Self {
        Self {
            inner: Arc::new(LockInner {
                order_key,
                monitor: ReentrantMutex::new(()),
            }),
        }
    }

    /// The system-wide key used to order acquisition, assigned at allocation.
    pub fn order_key(&self) -> u64 {
        self.inner.order_key
    }

    /// Blocks until the monitor is held by the current thread.
    pub fn enter(&self) -> ReentrantMutexGuard<'_, ()> {
        self.inner.monitor.lock()
    }

    /// Runs `f` while holding the monitor.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.enter();
        f()
    }

    pub fn is_locked(&self) -> bool {
        self.inner.monitor.is_locked()
    }
}

impl Default for LockId {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for LockId {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for LockId {}

impl fmt::Debug for LockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LockId")
            .field(&self.inner.order_key)
            .finish()
    }
}

/// A container whose operations run inside the monitor of [`LockContainer::lock`].
pub trait LockContainer<T>: Container<T> {
    fn lock(&self) -> &LockId;
}

/// A monitor-guarded container.
///
/// `get`, `set` and `modify` each hold the monitor for their whole body. Several
/// boxes may share one [`LockId`] to form a single mutual-exclusion domain.
pub struct LockBox<T> {
    inner: Arc<LockBoxInner<T>>,
}

struct LockBoxInner<T> {
    lock: LockId,
    value: Mutex<T>,
}

impl<T> LockBox<T> {
    pub fn of(value: T) -> Self {
        Self::with_lock(value, LockId::new())
    }

    pub fn with_lock(value: T, lock: LockId) -> Self {
        Self {
            inner: Arc::new(LockBoxInner {
                lock,
                value: Mutex::new(value),
            }),
        }
    }
}

impl<T> Clone for LockBox<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for LockBox<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockBox")
            .field("lock", &self.inner.lock)
            .field("value", &*self.inner.value.lock())
            .finish()
    }
}

impl<T: Clone> Container<T> for LockBox<T> {
    fn get(&self) -> T {
        self.inner
            .lock
            .run(|| self.inner.value.lock().clone())
    }

    fn set(&self, value: T) {
        self.inner
            .lock
            .run(|| *self.inner.value.lock() = value)
    }

    fn modify<F>(&self, mut f: F) -> T
    where
        F: FnMut(&T) -> T,
    {
        self.inner.lock.run(|| {
            // the value mutex is never held while `f` runs, so `f` may re-enter this box
            let current = self.inner.value.lock().clone();
            let next = f(&current);
            *self.inner.value.lock() = next.clone();
            next
        })
    }
}

impl<T: Clone> LockContainer<T> for LockBox<T> {
    fn lock(&self) -> &LockId {
        &self.inner.lock
    }
}
