use std::fmt;
use std::hash::Hash;

use indexmap::IndexSet;
use tracing::debug;

use crate::container::Container;
use crate::error::BoxError;
use crate::reactive::{Reactive, RxBox, Subscription};

/// How an [`RxOrderedSet`] resolves a list containing duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnDuplicate {
    /// Reject the whole list.
    #[default]
    Error,
    /// Keep the first occurrence of each value.
    TakeFirst,
    /// Keep the last occurrence of each value.
    TakeLast,
}

impl OnDuplicate {
    pub fn resolve<T>(&self, values: Vec<T>) -> Result<Vec<T>, BoxError>
    where
        T: Eq + Hash,
    {
        match self {
            OnDuplicate::Error => {
                let mut seen = IndexSet::with_capacity(values.len());
                for (index, value) in values.iter().enumerate() {
                    let (first_index, inserted) = seen.insert_full(value);
                    if !inserted {
                        debug!("Rejecting duplicate. index: {}, first_index: {}", index, first_index);
                        return Err(BoxError::DuplicateValue {
                            index,
                            first_index,
                        });
                    }
                }
                Ok(values)
            }
            OnDuplicate::TakeFirst => Ok(values
                .into_iter()
                .collect::<IndexSet<T>>()
                .into_iter()
                .collect()),
            OnDuplicate::TakeLast => {
                let mut resolved: Vec<T> = values
                    .into_iter()
                    .rev()
                    .collect::<IndexSet<T>>()
                    .into_iter()
                    .collect();
                resolved.reverse();
                Ok(resolved)
            }
        }
    }
}

/// A reactive, ordered list that never contains the same value twice.
///
/// Writes are resolved against the [`OnDuplicate`] policy chosen at construction.
pub struct RxOrderedSet<T> {
    rx: RxBox<Vec<T>>,
    policy: OnDuplicate,
}

impl<T> RxOrderedSet<T>
where
    T: Clone + Eq + Hash + Send + 'static,
{
    pub fn of_empty(policy: OnDuplicate) -> Self {
        Self {
            rx: RxBox::of(Vec::new()),
            policy,
        }
    }

    pub fn of(values: Vec<T>, policy: OnDuplicate) -> Result<Self, BoxError> {
        Ok(Self {
            rx: RxBox::of(policy.resolve(values)?),
            policy,
        })
    }

    pub fn policy(&self) -> OnDuplicate {
        self.policy
    }

    pub fn get(&self) -> Vec<T> {
        self.rx.get()
    }

    pub fn set(&self, values: Vec<T>) -> Result<(), BoxError> {
        let resolved = self.policy.resolve(values)?;
        self.rx.set(resolved);
        Ok(())
    }

    /// Atomically replaces the list with `f(current)`, resolved against the policy.
    ///
    /// On error the list is left unchanged.
    pub fn modify<F>(&self, mut f: F) -> Result<Vec<T>, BoxError>
    where
        F: FnMut(&Vec<T>) -> Vec<T>,
    {
        let mut error = None;
        let result = self.rx.modify(|current| match self.policy.resolve(f(current)) {
            Ok(resolved) => resolved,
            Err(e) => {
                error = Some(e);
                current.clone()
            }
        });
        match error {
            Some(e) => Err(e),
            None => Ok(result),
        }
    }

    pub fn contains(&self, value: &T) -> bool {
        self.rx.get().contains(value)
    }
}

impl<T> Clone for RxOrderedSet<T> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
            policy: self.policy,
        }
    }
}

impl<T> fmt::Debug for RxOrderedSet<T>
where
    T: Clone + Eq + Hash + Send + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RxOrderedSet")
            .field("policy", &self.policy)
            .field("values", &self.get())
            .finish()
    }
}

impl<T> Reactive<Vec<T>> for RxOrderedSet<T>
where
    T: Clone + Eq + Hash + Send + 'static,
{
    fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&Vec<T>) + Send + Sync + 'static,
    {
        self.rx.subscribe(observer)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(OnDuplicate::TakeLast, vec![2, 3, 4, 5, 1])]
    #[case(OnDuplicate::TakeFirst, vec![1, 2, 3, 4, 5])]
    fn duplicates_resolved_by_policy(#[case] policy: OnDuplicate, #[case] expected: Vec<i32>) {
        // given
        let set = RxOrderedSet::of_empty(policy);

        // when
        let result = set.set(vec![1, 2, 3, 4, 5, 1]);

        // then
        assert_eq!(result, Ok(()));
        assert_eq!(set.get(), expected);
    }

    #[test]
    fn error_policy_rejects_duplicates() {
        // given
        let set = RxOrderedSet::of(vec![9], OnDuplicate::Error).unwrap();

        // when
        let result = set.set(vec![1, 2, 3, 4, 5, 1]);

        // then
        assert_eq!(
            result,
            Err(BoxError::DuplicateValue {
                index: 5,
                first_index: 0
            })
        );
        assert_eq!(set.get(), vec![9]);
    }

    #[test]
    fn error_policy_accepts_unique_values() {
        let set = RxOrderedSet::of_empty(OnDuplicate::Error);

        set.set(vec!["a", "b"]).unwrap();

        assert_eq!(set.get(), vec!["a", "b"]);
        assert!(set.contains(&"a"));
    }

    #[test]
    fn failed_modify_leaves_list_unchanged_and_silent() {
        // given
        let set = RxOrderedSet::of(vec![1, 2], OnDuplicate::Error).unwrap();
        let notifications = Arc::new(Mutex::new(0));
        let _subscription = set.subscribe({
            let notifications = notifications.clone();
            move |_: &Vec<i32>| *notifications.lock() += 1
        });

        // when
        let result = set.modify(|current| {
            let mut next = current.clone();
            next.push(1);
            next
        });

        // then
        assert!(result.is_err());
        assert_eq!(set.get(), vec![1, 2]);
        assert_eq!(*notifications.lock(), 1);
    }

    #[test]
    fn modify_resolves_with_policy() {
        let set = RxOrderedSet::of(vec![1, 2, 3], OnDuplicate::TakeLast).unwrap();

        let result = set.modify(|current| {
            let mut next = current.clone();
            next.push(1);
            next
        });

        assert_eq!(result, Ok(vec![2, 3, 1]));
    }
}
