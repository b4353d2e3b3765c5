//! The value container contract and mapped views.
//!
//! A [`Container`] holds exactly one value. Variants add a concurrency
//! discipline on top of the basic `get`/`set`/`modify` contract:
//!
//! - [`CasBox`](crate::CasBox): optimistic compare-and-swap retry
//! - [`LockBox`](crate::LockBox): mutual exclusion through a [`LockId`](crate::LockId)
//! - [`RxBox`](crate::RxBox) / [`RxLockBox`](crate::RxLockBox): change notification
//!
//! A [`Mapped`] view exposes a converted value but always delegates to its
//! root, so it shares the root's atomicity domain.

use std::fmt;
use std::sync::Arc;

use crate::lock::{LockContainer, LockId};
use crate::reactive::{Reactive, Subscription};

pub trait Container<T> {
    fn get(&self) -> T;

    fn set(&self, value: T);

    /// Applies `f` to the current value, stores the result and returns the value now held.
    ///
    /// The provided implementation is not atomic; variants override it to add their guarantee.
    fn modify<F>(&self, mut f: F) -> T
    where
        F: FnMut(&T) -> T,
    {
        let next = f(&self.get());
        self.set(next);
        self.get()
    }
}

/// A container supporting lock-free compare-and-swap.
pub trait CasContainer<T>: Container<T> {
    /// Stores `update` if the current value equals `expect`.
    fn compare_and_set(&self, expect: &T, update: T) -> bool;

    fn get_and_set(&self, value: T) -> T;
}

/// A pair of pure conversion functions.
///
/// `revert(convert(x)) == x` is expected to hold for every `x`; this is not checked.
pub struct Converter<T, R> {
    forward: Arc<dyn Fn(&T) -> R + Send + Sync>,
    backward: Arc<dyn Fn(&R) -> T + Send + Sync>,
}

impl<T, R> Converter<T, R> {
    pub fn new<F, B>(forward: F, backward: B) -> Self
    where
        F: Fn(&T) -> R + Send + Sync + 'static,
        B: Fn(&R) -> T + Send + Sync + 'static,
    {
        Self {
            forward: Arc::new(forward),
            backward: Arc::new(backward),
        }
    }

    pub fn convert(&self, value: &T) -> R {
        (self.forward)(value)
    }

    pub fn revert(&self, value: &R) -> T {
        (self.backward)(value)
    }

    /// Swaps the direction of the conversion.
    pub fn reverse(&self) -> Converter<R, T> {
        Converter {
            forward: Arc::clone(&self.backward),
            backward: Arc::clone(&self.forward),
        }
    }
}

impl<T, R> Clone for Converter<T, R> {
    fn clone(&self) -> Self {
        Self {
            forward: Arc::clone(&self.forward),
            backward: Arc::clone(&self.backward),
        }
    }
}

impl<T, R> fmt::Debug for Converter<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter").finish_non_exhaustive()
    }
}

/// A converted view over a root container.
///
/// Reads convert the root's value, writes revert before delegating. Nothing is
/// stored in the view itself, so it is valid for as long as the root is.
pub struct Mapped<B, T, R> {
    root: B,
    converter: Converter<T, R>,
}

impl<B, T, R> Mapped<B, T, R> {
    pub fn new(root: B, converter: Converter<T, R>) -> Self {
        Self {
            root,
            converter,
        }
    }

    pub fn root(&self) -> &B {
        &self.root
    }

    pub fn converter(&self) -> &Converter<T, R> {
        &self.converter
    }
}

impl<B: Clone, T, R> Clone for Mapped<B, T, R> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            converter: self.converter.clone(),
        }
    }
}

impl<B: fmt::Debug, T, R> fmt::Debug for Mapped<B, T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapped")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl<B, T, R> Container<R> for Mapped<B, T, R>
where
    B: Container<T>,
{
    fn get(&self) -> R {
        self.converter.convert(&self.root.get())
    }

    fn set(&self, value: R) {
        self.root.set(self.converter.revert(&value))
    }

    fn modify<F>(&self, mut f: F) -> R
    where
        F: FnMut(&R) -> R,
    {
        let converter = &self.converter;
        // single delegated call keeps the read-modify-write inside the root's critical section
        let result = self
            .root
            .modify(|value| converter.revert(&f(&converter.convert(value))));
        converter.convert(&result)
    }
}

impl<B, T, R> CasContainer<R> for Mapped<B, T, R>
where
    B: CasContainer<T>,
{
    fn compare_and_set(&self, expect: &R, update: R) -> bool {
        self.root.compare_and_set(
            &self.converter.revert(expect),
            self.converter.revert(&update),
        )
    }

    fn get_and_set(&self, value: R) -> R {
        let previous = self
            .root
            .get_and_set(self.converter.revert(&value));
        self.converter.convert(&previous)
    }
}

impl<B, T, R> LockContainer<R> for Mapped<B, T, R>
where
    B: LockContainer<T>,
{
    fn lock(&self) -> &LockId {
        self.root.lock()
    }
}

impl<B, T, R> Reactive<R> for Mapped<B, T, R>
where
    B: Reactive<T>,
    T: 'static,
    R: Clone + PartialEq + Send + 'static,
{
    /// Re-emits only when the converted value changes.
    fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&R) + Send + Sync + 'static,
    {
        let converter = self.converter.clone();
        let last: parking_lot::Mutex<Option<R>> = parking_lot::Mutex::new(None);
        self.root.subscribe(move |value| {
            let converted = converter.convert(value);
            {
                let mut last = last.lock();
                if last.as_ref() == Some(&converted) {
                    return;
                }
                *last = Some(converted.clone());
            }
            observer(&converted);
        })
    }
}

pub trait ContainerExt<T>: Container<T> + Clone + Sized {
    /// Creates a view of this container through `converter`.
    fn map<R>(&self, converter: Converter<T, R>) -> Mapped<Self, T, R> {
        Mapped::new(self.clone(), converter)
    }
}

impl<T, C> ContainerExt<T> for C where C: Container<T> + Clone {}
