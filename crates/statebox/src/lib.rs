//! Thread-safe observable value containers.
//!
//! This crate provides single-value containers ("boxes") for state shared
//! across threads, with a choice of atomicity strategy and an optional
//! change-notification layer.
//!
//! # Key Features
//!
//! - [`CasBox`]: lock-free optimistic updates through compare-and-swap
//! - [`LockBox`]: updates under an explicit, shareable [`LockId`] monitor
//! - [`OrderedLock`]: deadlock-free acquisition of several monitors at once
//! - [`RxBox`] / [`RxLockBox`]: emit-on-change notification, replaying the latest value
//! - Mapped views through a [`Converter`] that keep the root's atomicity domain
//! - [`enforce`]: invariant enforcement, and [`Breaker`]: a switchable coupling
//!
//! # Example
//!
//! ```rust
//! use std::thread;
//! use statebox::{Container, ContainerExt, Converter, LockBox, LockContainer, OrderedLock};
//!
//! // Two boxes that must be updated together
//! let from = LockBox::of(100i64);
//! let to = LockBox::of(0i64);
//! let transfer = OrderedLock::on([from.lock().clone(), to.lock().clone()]);
//!
//! let handles: Vec<_> = (0..4)
//!     .map(|_| {
//!         let (from, to, transfer) = (from.clone(), to.clone(), transfer.clone());
//!         thread::spawn(move || {
//!             transfer.take(|| {
//!                 from.modify(|v| v - 10);
//!                 to.modify(|v| v + 10);
//!             })
//!         })
//!     })
//!     .collect();
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//!
//! // A view in cents still shares the lock of its root
//! let cents = to.map(Converter::new(|v: &i64| v * 100, |v: &i64| v / 100));
//! assert_eq!(cents.lock(), to.lock());
//! assert_eq!(cents.get(), 4000);
//! assert_eq!(from.get() + to.get(), 100);
//! ```

pub mod breaker;
pub mod cas;
pub mod container;
pub mod enforcer;
pub mod error;
pub mod lock;
pub mod ordered_lock;
pub mod ordered_set;
pub mod reactive;

#[cfg(feature = "testing")]
pub mod test;

pub use breaker::Breaker;
pub use cas::CasBox;
pub use container::{CasContainer, Container, ContainerExt, Converter, Mapped};
pub use enforcer::{enforce, Enforced};
pub use error::BoxError;
pub use lock::{LockBox, LockContainer, LockId};
pub use ordered_lock::OrderedLock;
pub use ordered_set::{OnDuplicate, RxOrderedSet};
pub use reactive::{Derived, Reactive, RxBox, RxContainer, RxLockBox, Subscription, SubscriptionRegistry};
