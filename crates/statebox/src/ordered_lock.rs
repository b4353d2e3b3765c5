//! Deadlock-free acquisition of several monitors.
//!
//! Every [`OrderedLock`] sorts its locks by [`LockId::order_key`], so any two
//! instances sharing locks acquire those locks in the same relative order and
//! can never wait on each other circularly. This only holds if all mutation of
//! the guarded containers goes through their own `modify` or an `OrderedLock`.
//!
//! Construct once and reuse; construction deduplicates and sorts.

use parking_lot::ReentrantMutex;
use tracing::{debug, trace};

use crate::lock::LockId;

/// Taken before anything else by lock sets containing colliding order keys.
static TIE_BREAKER: ReentrantMutex<()> = parking_lot::const_reentrant_mutex(());

#[derive(Debug, Clone)]
pub struct OrderedLock {
    locks: Vec<LockId>,
    needs_tie_breaker: bool,
}

impl OrderedLock {
    pub fn on<I>(locks: I) -> Self
    where
        I: IntoIterator<Item = LockId>,
    {
        let mut unique: Vec<LockId> = Vec::new();
        for lock in locks {
            if !unique.contains(&lock) {
                unique.push(lock);
            }
        }
        unique.sort_by_key(LockId::order_key);

        let needs_tie_breaker = unique
            .windows(2)
            .any(|pair| pair[0].order_key() == pair[1].order_key());

        debug!("Ordered lock created. locks: {}, needs_tie_breaker: {}", unique.len(), needs_tie_breaker);

        Self {
            locks: unique,
            needs_tie_breaker,
        }
    }

    /// The deduplicated locks, in acquisition order.
    pub fn locks(&self) -> &[LockId] {
        &self.locks
    }

    pub fn needs_tie_breaker(&self) -> bool {
        self.needs_tie_breaker
    }

    /// Holds every lock, in order, while `supplier` runs.
    pub fn take_and_get<R>(&self, supplier: impl FnOnce() -> R) -> R {
        trace!("Taking ordered lock. locks: {:?}", self.locks);
        if self.needs_tie_breaker {
            let _tie_breaker = TIE_BREAKER.lock();
            take_nested(&self.locks, supplier)
        } else {
            take_nested(&self.locks, supplier)
        }
    }

    pub fn take(&self, runnable: impl FnOnce()) {
        self.take_and_get(runnable)
    }
}

fn take_nested<R>(locks: &[LockId], supplier: impl FnOnce() -> R) -> R {
    match locks.split_first() {
        None => supplier(),
        Some((first, rest)) => first.run(|| take_nested(rest, supplier)),
    }
}
