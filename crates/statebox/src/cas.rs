use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::trace;

use crate::container::{CasContainer, Container};

/// A lock-free container built on compare-and-swap.
///
/// `modify` reads the current value, computes a candidate and swaps it in only
/// if nothing else was committed meanwhile, retrying otherwise. The function
/// passed to `modify` may therefore run several times per call and **must be
/// pure**. Under pathological contention the retry loop can livelock; it never
/// blocks.
pub struct CasBox<T> {
    cell: Arc<ArcSwap<T>>,
}

impl<T> CasBox<T> {
    pub fn of(value: T) -> Self {
        Self {
            cell: Arc::new(ArcSwap::from_pointee(value)),
        }
    }
}

impl<T> Clone for CasBox<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for CasBox<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CasBox")
            .field(&**self.cell.load())
            .finish()
    }
}

fn into_value<T: Clone>(shared: Arc<T>) -> T {
    Arc::try_unwrap(shared).unwrap_or_else(|shared| T::clone(&shared))
}

impl<T: Clone> Container<T> for CasBox<T> {
    fn get(&self) -> T {
        T::clone(&self.cell.load())
    }

    fn set(&self, value: T) {
        self.cell.store(Arc::new(value));
    }

    fn modify<F>(&self, mut f: F) -> T
    where
        F: FnMut(&T) -> T,
    {
        let mut attempt = 0usize;
        loop {
            let current = self.cell.load_full();
            let candidate = Arc::new(f(&current));
            // `current` keeps its allocation alive, so the pointer comparison cannot suffer ABA
            let previous = self
                .cell
                .compare_and_swap(&current, Arc::clone(&candidate));
            if Arc::ptr_eq(&*previous, &current) {
                return T::clone(&candidate);
            }
            attempt += 1;
            trace!("CAS contended, retrying. attempt: {}", attempt);
        }
    }
}

impl<T: Clone + PartialEq> CasContainer<T> for CasBox<T> {
    fn compare_and_set(&self, expect: &T, update: T) -> bool {
        let update = Arc::new(update);
        loop {
            let current = self.cell.load_full();
            if *current != *expect {
                return false;
            }
            let previous = self
                .cell
                .compare_and_swap(&current, Arc::clone(&update));
            if Arc::ptr_eq(&*previous, &current) {
                return true;
            }
            // a different allocation replaced `current`; it may still hold an equal value
        }
    }

    fn get_and_set(&self, value: T) -> T {
        into_value(self.cell.swap(Arc::new(value)))
    }
}
