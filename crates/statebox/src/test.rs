//! Helpers for tests of code built on reactive containers.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::reactive::{Reactive, Subscription};

/// Installs a `tracing` subscriber writing through the test harness.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .try_init();
}

/// Describes the threads parking_lot currently sees deadlocked, for failure messages.
///
/// Only populated with the `deadlock_detection` feature enabled.
#[cfg(feature = "deadlock_detection")]
pub fn deadlock_report() -> String {
    let cycles = parking_lot::deadlock::check_deadlock();
    if cycles.is_empty() {
        return "no deadlock cycle detected".to_string();
    }
    let threads: Vec<Vec<usize>> = cycles
        .iter()
        .map(|cycle| {
            cycle
                .iter()
                .map(|thread| thread.thread_id())
                .collect()
        })
        .collect();
    format!("Deadlocked threads. cycles: {}, thread_ids: {:?}", cycles.len(), threads)
}

#[cfg(not(feature = "deadlock_detection"))]
pub fn deadlock_report() -> String {
    "deadlock detection disabled, enable the `deadlock_detection` feature for details".to_string()
}

/// Collects every value emitted by a reactive source.
pub struct Recorder<T> {
    values: Arc<Mutex<Vec<T>>>,
    subscription: Subscription,
}

impl<T> Recorder<T>
where
    T: Clone + Send + 'static,
{
    pub fn attach<R>(source: &R) -> Self
    where
        R: Reactive<T>,
    {
        let values = Arc::new(Mutex::new(Vec::new()));
        let subscription = source.subscribe({
            let values = values.clone();
            move |value: &T| values.lock().push(value.clone())
        });
        Self {
            values,
            subscription,
        }
    }

    /// Everything recorded so far, including the value replayed on attach.
    pub fn values(&self) -> Vec<T> {
        self.values.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.values.lock().len()
    }

    pub fn detach(&self) {
        self.subscription.dispose();
    }
}

impl<T: fmt::Debug> fmt::Debug for Recorder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recorder")
            .field("values", &*self.values.lock())
            .finish()
    }
}
