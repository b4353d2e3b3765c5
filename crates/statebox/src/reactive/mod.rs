//! Core reactive system components.
//!
//! - [`RxBox<T>`]: a container that notifies subscribers when its value changes
//! - [`RxLockBox<T>`]: an `RxBox` whose mutation and notification share one monitor
//! - [`Derived<T>`]: read-only values computed from other reactive containers
//! - [`SubscriptionRegistry`]: keeps subscriptions alive and disposes them together
//!
//! Notification is synchronous: observers run inside the `set` or `modify`
//! call that caused the change, and no lock of the emitting box is held while
//! they do. Each box delivers values in commit order. A `set` made by an
//! observer is delivered after the current value has reached every observer.
//! When writers race on an `RxBox`, the writer already delivering also delivers
//! the other's values; an `RxLockBox` always delivers on the writing thread,
//! before its monitor is released. A new subscriber receives the current value
//! immediately, then each subsequent distinct value.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use statebox::{Container, Reactive, RxBox, SubscriptionRegistry};
//!
//! let registry = SubscriptionRegistry::new();
//!
//! let count = RxBox::of(0i32);
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! registry.register(count.subscribe({
//!     let seen = seen.clone();
//!     move |value| seen.lock().push(*value)
//! }));
//!
//! count.set(5);
//! count.set(5);
//! count.modify(|value| value * 2);
//!
//! assert_eq!(*seen.lock(), vec![0, 5, 10]);
//! registry.dispose_all();
//! ```

mod derived;
mod publisher;
mod registry;
mod rx_box;

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::container::Container;

pub use derived::Derived;
pub use registry::SubscriptionRegistry;
pub use rx_box::{RxBox, RxLockBox};

pub(crate) use publisher::Publisher;

/// A source of change notifications.
pub trait Reactive<T> {
    /// Registers `observer`, which is invoked at once with the current value
    /// and afterwards with every distinct value, until the returned
    /// [`Subscription`] is disposed.
    fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static;
}

/// A container that is also reactive.
pub trait RxContainer<T>: Container<T> + Reactive<T> {}

impl<T, C> RxContainer<T> for C where C: Container<T> + Reactive<T> {}

type Teardown = Box<dyn FnOnce() + Send>;

/// Handle to a live registration.
///
/// Subscriptions are not disposed on drop; an undisposed subscription keeps its
/// observer registered. Disposing more than once is a no-op.
#[derive(Clone)]
#[must_use = "an observer stays registered until its subscription is disposed"]
pub struct Subscription {
    teardown: Arc<Mutex<Option<Teardown>>>,
}

impl Subscription {
    pub fn new(teardown: impl FnOnce() + Send + 'static) -> Self {
        Self {
            teardown: Arc::new(Mutex::new(Some(Box::new(teardown)))),
        }
    }

    /// A subscription that is already disposed.
    pub fn empty() -> Self {
        Self {
            teardown: Arc::new(Mutex::new(None)),
        }
    }

    pub fn dispose(&self) {
        let teardown = self.teardown.lock().take();
        if let Some(teardown) = teardown {
            teardown();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.teardown.lock().is_none()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
