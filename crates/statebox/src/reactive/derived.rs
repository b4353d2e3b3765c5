use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{RxBox, RxContainer, Reactive, Subscription, SubscriptionRegistry};
use crate::container::Container;

/// A read-only value computed from other reactive containers.
///
/// The value is recomputed synchronously whenever a source emits, and only
/// distinct results are passed on to subscribers. Sources stay subscribed
/// until [`Derived::dispose`] is called.
pub struct Derived<T> {
    value: RxBox<T>,
    sources: Arc<SubscriptionRegistry>,
}

impl<T> Derived<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    pub fn map<A, S, F>(source: &S, compute: F) -> Self
    where
        S: RxContainer<A>,
        F: Fn(&A) -> T + Send + Sync + 'static,
    {
        let value = RxBox::of(compute(&source.get()));
        let sources = Arc::new(SubscriptionRegistry::new());
        sources.register(source.subscribe({
            let value = value.clone();
            move |a| value.set(compute(a))
        }));

        Self {
            value,
            sources,
        }
    }

    /// Tracks two sources.
    ///
    /// Each source's subscription records its latest value in a shared
    /// snapshot, and the result is computed from that snapshot. Sources are
    /// never read from inside a notification, so two threads writing `a` and
    /// `b` at the same time cannot wait on each other's locks.
    pub fn combine<A, B, SA, SB, F>(a: &SA, b: &SB, compute: F) -> Self
    where
        A: Clone + Send + 'static,
        B: Clone + Send + 'static,
        SA: RxContainer<A>,
        SB: RxContainer<B>,
        F: Fn(&A, &B) -> T + Send + Sync + 'static,
    {
        let compute = Arc::new(compute);
        let latest = Arc::new(Mutex::new((a.get(), b.get())));
        let value = {
            let latest = latest.lock();
            RxBox::of(compute(&latest.0, &latest.1))
        };
        let sources = Arc::new(SubscriptionRegistry::new());

        sources.register(a.subscribe({
            let (latest, value, compute) = (latest.clone(), value.clone(), compute.clone());
            move |a_value: &A| {
                value.modify(|_| {
                    let mut latest = latest.lock();
                    latest.0 = a_value.clone();
                    compute(&latest.0, &latest.1)
                });
            }
        }));
        sources.register(b.subscribe({
            let (latest, value) = (latest, value.clone());
            move |b_value: &B| {
                value.modify(|_| {
                    let mut latest = latest.lock();
                    latest.1 = b_value.clone();
                    compute(&latest.0, &latest.1)
                });
            }
        }));

        Self {
            value,
            sources,
        }
    }

    pub fn get(&self) -> T {
        self.value.get()
    }

    /// Stops tracking the sources; the last computed value is kept.
    pub fn dispose(&self) {
        self.sources.dispose_all();
    }
}

impl<T> Clone for Derived<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            sources: Arc::clone(&self.sources),
        }
    }
}

impl<T> fmt::Debug for Derived<T>
where
    T: Clone + PartialEq + Send + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Derived")
            .field(&self.get())
            .finish()
    }
}

impl<T> Reactive<T> for Derived<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.value.subscribe(observer)
    }
}
