//! A switchable coupling between a reactive container and a local copy.
//!
//! While closed, a [`Breaker`] and its delegate mirror each other: writes to
//! either are visible in both. While open they evolve independently. Closing
//! pushes the breaker's value into the delegate before resuming propagation.

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use parking_lot::ReentrantMutex;
use tracing::debug;

use crate::container::Container;
use crate::reactive::{RxBox, RxContainer, Reactive, Subscription};

pub struct Breaker<B, T> {
    inner: Arc<BreakerInner<B, T>>,
}

struct BreakerInner<B, T> {
    delegate: B,
    local: RxBox<T>,
    /// `Some` while closed: the subscription forwarding delegate emissions into `local`.
    coupling: ReentrantMutex<RefCell<Option<Subscription>>>,
}

impl<B, T> Breaker<B, T>
where
    B: RxContainer<T> + Send + Sync + 'static,
    T: Clone + PartialEq + Send + 'static,
{
    /// A closed breaker starting from the delegate's current value.
    pub fn create_closed(delegate: B) -> Self {
        let initial = delegate.get();
        let breaker = Self::create_open(delegate, initial);
        breaker.set_closed(true);
        breaker
    }

    /// An open breaker holding `initial`, independent of the delegate until closed.
    pub fn create_open(delegate: B, initial: T) -> Self {
        Self {
            inner: Arc::new(BreakerInner {
                delegate,
                local: RxBox::of(initial),
                coupling: ReentrantMutex::new(RefCell::new(None)),
            }),
        }
    }

    pub fn delegate(&self) -> &B {
        &self.inner.delegate
    }

    pub fn is_closed(&self) -> bool {
        self.inner.coupling.lock().borrow().is_some()
    }

    /// Closes or opens the breaker. Requesting the current state does nothing.
    pub fn set_closed(&self, closed: bool) {
        let coupling = self.inner.coupling.lock();
        if coupling.borrow().is_some() == closed {
            return;
        }

        if closed {
            self.inner.delegate.set(self.inner.local.get());
            let subscription = self.inner.delegate.subscribe({
                let local = self.inner.local.clone();
                move |value: &T| local.set(value.clone())
            });
            *coupling.borrow_mut() = Some(subscription);
            debug!("Breaker closed");
        } else {
            let subscription = coupling.borrow_mut().take();
            if let Some(subscription) = subscription {
                subscription.dispose();
            }
            debug!("Breaker opened");
        }
    }
}

impl<B, T> Clone for Breaker<B, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B, T> fmt::Debug for Breaker<B, T>
where
    B: RxContainer<T> + Send + Sync + fmt::Debug + 'static,
    T: Clone + PartialEq + Send + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Breaker")
            .field("closed", &self.is_closed())
            .field("value", &self.get())
            .field("delegate", &self.inner.delegate)
            .finish()
    }
}

impl<B, T> Container<T> for Breaker<B, T>
where
    B: RxContainer<T> + Send + Sync + 'static,
    T: Clone + PartialEq + Send + 'static,
{
    fn get(&self) -> T {
        self.inner.local.get()
    }

    fn set(&self, value: T) {
        let coupling = self.inner.coupling.lock();
        self.inner.local.set(value.clone());
        if coupling.borrow().is_some() {
            self.inner.delegate.set(value);
        }
    }

    /// While closed the update is applied to the delegate and reaches the
    /// local value through the forwarding subscription.
    fn modify<F>(&self, f: F) -> T
    where
        F: FnMut(&T) -> T,
    {
        let coupling = self.inner.coupling.lock();
        let closed = coupling.borrow().is_some();
        if closed {
            self.inner.delegate.modify(f)
        } else {
            self.inner.local.modify(f)
        }
    }
}

impl<B, T> Reactive<T> for Breaker<B, T>
where
    B: RxContainer<T> + Send + Sync + 'static,
    T: Clone + PartialEq + Send + 'static,
{
    fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.inner.local.subscribe(observer)
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::reactive::RxLockBox;

    #[test]
    fn closed_breaker_propagates_both_ways_and_open_breaker_isolates() {
        // given
        let delegate = RxBox::of(1);
        let breaker = Breaker::create_closed(delegate.clone());

        // when
        breaker.set(2);
        // then
        assert_eq!(delegate.get(), 2);

        // when
        delegate.set(3);
        // then
        assert_eq!(breaker.get(), 3);

        // when
        breaker.set_closed(false);
        delegate.set(4);
        // then
        assert_eq!(breaker.get(), 3);

        // when
        breaker.set(5);
        // then
        assert_eq!(delegate.get(), 4);

        // when
        breaker.set_closed(true);
        // then
        assert_eq!(delegate.get(), 5);

        // when
        delegate.set(6);
        // then
        assert_eq!(breaker.get(), 6);
    }

    #[test]
    fn redundant_state_changes_are_no_ops() {
        // given
        let delegate = RxLockBox::of("a".to_string());
        let breaker = Breaker::create_open(delegate.clone(), "b".to_string());

        // when
        breaker.set_closed(false);

        // then
        assert!(!breaker.is_closed());
        assert_eq!(delegate.get(), "a");
        assert_eq!(delegate.observer_count(), 0);

        // when
        breaker.set_closed(true);
        breaker.set_closed(true);

        // then
        assert!(breaker.is_closed());
        assert_eq!(delegate.get(), "b");
        assert_eq!(delegate.observer_count(), 1);

        // when
        breaker.set_closed(false);
        breaker.set_closed(false);

        // then
        assert_eq!(delegate.observer_count(), 0);
    }

    #[test]
    fn subscribers_follow_the_local_value() {
        // given
        let delegate = RxBox::of(0);
        let breaker = Breaker::create_closed(delegate.clone());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let _subscription = breaker.subscribe({
            let seen = seen.clone();
            move |value: &i32| seen.lock().push(*value)
        });

        // when
        delegate.set(1);
        breaker.set_closed(false);
        delegate.set(2);
        breaker.modify(|v| v + 10);

        // then
        assert_eq!(*seen.lock(), vec![0, 1, 11]);
        assert_eq!(delegate.get(), 2);
    }

    #[test]
    fn closed_modify_applies_to_the_delegate() {
        // given
        let delegate = RxBox::of(1);
        let breaker = Breaker::create_closed(delegate.clone());

        // when
        let result = breaker.modify(|v| v * 7);

        // then
        assert_eq!(result, 7);
        assert_eq!(delegate.get(), 7);
        assert_eq!(breaker.get(), 7);
    }
}
