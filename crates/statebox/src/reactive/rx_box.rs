use std::fmt;
use std::sync::Arc;

use super::{Publisher, Reactive, Subscription};
use crate::container::Container;
use crate::lock::{LockContainer, LockId};

/// A container that notifies its subscribers whenever its value changes.
///
/// Setting a value equal to the current one is a no-op: nothing is stored and
/// nothing is emitted.
pub struct RxBox<T> {
    publisher: Arc<Publisher<T>>,
}

impl<T> RxBox<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    pub fn of(value: T) -> Self {
        Self {
            publisher: Arc::new(Publisher::new(value)),
        }
    }

    /// Number of currently registered observers.
    pub fn observer_count(&self) -> usize {
        self.publisher.observer_count()
    }
}

impl<T> Clone for RxBox<T> {
    fn clone(&self) -> Self {
        Self {
            publisher: Arc::clone(&self.publisher),
        }
    }
}

impl<T> fmt::Debug for RxBox<T>
where
    T: Clone + PartialEq + Send + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RxBox")
            .field(&self.publisher.get())
            .finish()
    }
}

impl<T> Container<T> for RxBox<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    fn get(&self) -> T {
        self.publisher.get()
    }

    fn set(&self, value: T) {
        self.publisher.set(value);
    }

    fn modify<F>(&self, f: F) -> T
    where
        F: FnMut(&T) -> T,
    {
        self.publisher.modify(f)
    }
}

impl<T> Reactive<T> for RxBox<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.publisher.subscribe(Arc::new(observer))
    }
}

/// A reactive container guarded by a monitor.
///
/// The body of `set` and `modify`, the change check and the notification all
/// run before the monitor is released, so concurrent writers cannot both
/// decide a value changed and subscribers observe changes in commit order.
pub struct RxLockBox<T> {
    lock: LockId,
    rx: RxBox<T>,
}

impl<T> RxLockBox<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    pub fn of(value: T) -> Self {
        Self::with_lock(value, LockId::new())
    }

    pub fn with_lock(value: T, lock: LockId) -> Self {
        Self {
            lock,
            rx: RxBox::of(value),
        }
    }

    pub fn observer_count(&self) -> usize {
        self.rx.observer_count()
    }
}

impl<T> Clone for RxLockBox<T> {
    fn clone(&self) -> Self {
        Self {
            lock: self.lock.clone(),
            rx: self.rx.clone(),
        }
    }
}

impl<T> fmt::Debug for RxLockBox<T>
where
    T: Clone + PartialEq + Send + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RxLockBox")
            .field("lock", &self.lock)
            .field("value", &self.get())
            .finish()
    }
}

impl<T> Container<T> for RxLockBox<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    fn get(&self) -> T {
        self.lock.run(|| self.rx.get())
    }

    fn set(&self, value: T) {
        self.lock.run(|| self.rx.set(value))
    }

    fn modify<F>(&self, f: F) -> T
    where
        F: FnMut(&T) -> T,
    {
        self.lock.run(|| self.rx.modify(f))
    }
}

impl<T> LockContainer<T> for RxLockBox<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    fn lock(&self) -> &LockId {
        &self.lock
    }
}

impl<T> Reactive<T> for RxLockBox<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.lock.run(|| self.rx.subscribe(observer))
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::container::{ContainerExt, Converter};

    fn record<T, R>(reactive: &R) -> (Arc<Mutex<Vec<T>>>, Subscription)
    where
        T: Clone + Send + 'static,
        R: Reactive<T>,
    {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let subscription = reactive.subscribe({
            let seen = seen.clone();
            move |value: &T| seen.lock().push(value.clone())
        });
        (seen, subscription)
    }

    #[test]
    fn setting_same_value_twice_notifies_once() {
        // given
        let rx = RxBox::of(1);
        let (seen, _subscription) = record(&rx);

        // when
        rx.set(2);
        rx.set(2);

        // then
        assert_eq!(*seen.lock(), vec![1, 2]);
    }

    #[test]
    fn mapped_view_emits_only_when_converted_value_changes() {
        // given
        let rx = RxBox::of(1);
        let tens = rx.map(Converter::new(|v: &i32| v / 10, |v: &i32| v * 10));
        let (seen, _subscription) = record(&tens);

        // when
        rx.set(2);
        rx.set(9);
        rx.set(12);
        rx.set(15);
        rx.set(31);

        // then
        assert_eq!(*seen.lock(), vec![0, 1, 3]);
        assert_eq!(tens.get(), 3);
    }

    #[test]
    fn mapped_set_writes_reverted_value() {
        let rx = RxBox::of(0);
        let tens = rx.map(Converter::new(|v: &i32| v / 10, |v: &i32| v * 10));

        tens.set(4);

        assert_eq!(rx.get(), 40);
    }

    #[test]
    fn disposed_subscription_stops_notifications() {
        // given
        let rx = RxLockBox::of("a".to_string());
        let (seen, subscription) = record(&rx);

        // when
        subscription.dispose();
        rx.set("b".to_string());

        // then
        assert_eq!(*seen.lock(), vec!["a".to_string()]);
        assert_eq!(rx.observer_count(), 0);
    }

    #[test]
    fn rx_lock_box_notifies_while_holding_monitor() {
        // given
        let rx = RxLockBox::of(0u8);
        let held = Arc::new(Mutex::new(Vec::new()));
        let _subscription = rx.subscribe({
            let lock = rx.lock().clone();
            let held = held.clone();
            move |_| held.lock().push(lock.is_locked())
        });

        // when
        rx.modify(|v| v + 1);

        // then
        assert_eq!(*held.lock(), vec![true, true]);
        assert!(!rx.lock().is_locked());
    }

    #[test]
    fn mapped_rx_lock_box_shares_lock() {
        let rx = RxLockBox::of(3i32);
        let view = rx.map(Converter::new(|v: &i32| i64::from(*v), |v: &i64| *v as i32));

        assert_eq!(view.lock(), rx.lock());
    }
}
