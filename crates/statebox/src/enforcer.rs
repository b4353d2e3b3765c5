//! Invariant enforcement over reactive containers.
//!
//! [`enforce`] watches every raw emission of a container and writes back the
//! corrected value, returning a facade through which only corrected values are
//! visible. The invariant function must be idempotent in intent
//! (`f(f(x)) == f(x)`).
//!
//! Two enforcers with contradictory invariants on the same container correct
//! each other forever. This is not detected.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::container::{Container, Converter, Mapped};
use crate::lock::{LockContainer, LockId};
use crate::reactive::{RxContainer, Reactive, Subscription};

/// Attaches `invariant` to `container`.
///
/// The current value is corrected immediately. Every value later returned by
/// the facade's `get`, or delivered to its subscribers, satisfies
/// `invariant(x) == x`. The underlying container may briefly hold a violating
/// value between a raw `set` and its correction.
pub fn enforce<B, T, F>(container: B, invariant: F) -> Enforced<B, T>
where
    B: RxContainer<T> + Clone + Send + Sync + 'static,
    T: Clone + PartialEq + Send + 'static,
    F: Fn(&T) -> T + Send + Sync + 'static,
{
    let invariant = Arc::new(invariant);
    let converter = Converter::new(
        {
            let invariant = invariant.clone();
            move |value: &T| invariant(value)
        },
        {
            let invariant = invariant.clone();
            move |value: &T| invariant(value)
        },
    );

    let subscription = container.subscribe({
        let upstream = container.clone();
        move |value| {
            let corrected = invariant(value);
            if corrected != *value {
                trace!("Correcting value that violates invariant");
                upstream.set(corrected);
            }
        }
    });
    debug!("Invariant enforcer attached");

    Enforced {
        view: Mapped::new(container, converter),
        subscription,
    }
}

/// A facade exposing only values that satisfy an invariant.
pub struct Enforced<B, T> {
    view: Mapped<B, T, T>,
    subscription: Subscription,
}

impl<B, T> Enforced<B, T> {
    /// The container the invariant is enforced on.
    pub fn underlying(&self) -> &B {
        self.view.root()
    }

    /// Stops correcting the underlying container. Safe to call repeatedly.
    pub fn dispose(&self) {
        if !self.subscription.is_disposed() {
            debug!("Invariant enforcer detached");
        }
        self.subscription.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.subscription.is_disposed()
    }
}

impl<B: Clone, T> Clone for Enforced<B, T> {
    fn clone(&self) -> Self {
        Self {
            view: self.view.clone(),
            subscription: self.subscription.clone(),
        }
    }
}

impl<B: fmt::Debug, T> fmt::Debug for Enforced<B, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enforced")
            .field("underlying", self.view.root())
            .field("subscription", &self.subscription)
            .finish()
    }
}

impl<B, T> Container<T> for Enforced<B, T>
where
    B: Container<T>,
{
    fn get(&self) -> T {
        self.view.get()
    }

    fn set(&self, value: T) {
        self.view.set(value)
    }

    fn modify<F>(&self, f: F) -> T
    where
        F: FnMut(&T) -> T,
    {
        self.view.modify(f)
    }
}

impl<B, T> LockContainer<T> for Enforced<B, T>
where
    B: LockContainer<T>,
{
    fn lock(&self) -> &LockId {
        self.view.lock()
    }
}

impl<B, T> Reactive<T> for Enforced<B, T>
where
    B: Reactive<T>,
    T: Clone + PartialEq + Send + 'static,
{
    fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.view.subscribe(observer)
    }
}
