use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;

use parking_lot::{Mutex, ReentrantMutex};
use tracing::trace;

use super::Subscription;

type Observer<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Single-slot replay-latest broadcaster, holding the current value.
///
/// Writes append to a FIFO of pending deliveries. Whichever thread finds the
/// queue idle drains it, and keeps draining until it is empty, so every
/// observer sees values in the order they were committed. Observers never run
/// while `state` is locked. A `set` made from inside an observer is queued and
/// delivered once the current round has reached every observer.
pub(crate) struct Publisher<T> {
    /// Serialises read-modify-write; never held while observers run.
    writer: ReentrantMutex<()>,
    state: Mutex<PublisherState<T>>,
}

struct PublisherState<T> {
    current: T,
    /// The last value handed to observers, replayed to newly attached ones.
    delivered: T,
    observers: Vec<(u64, Observer<T>)>,
    pending: VecDeque<Pending<T>>,
    draining: bool,
    next_id: u64,
}

enum Pending<T> {
    Emit(T),
    Attach(u64, Observer<T>),
}

enum Delivery<T> {
    Emit(T, Vec<Observer<T>>),
    Replay(T, Observer<T>),
}

/// Releases the drain token if an observer panics.
struct DrainToken<'a, T> {
    state: &'a Mutex<PublisherState<T>>,
    released: bool,
}

impl<T> Drop for DrainToken<'_, T> {
    fn drop(&mut self) {
        if !self.released && thread::panicking() {
            let mut state = self.state.lock();
            state.draining = false;
            state.pending.clear();
        }
    }
}

impl<T> Publisher<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    pub fn new(value: T) -> Self {
        Self {
            writer: ReentrantMutex::new(()),
            state: Mutex::new(PublisherState {
                current: value.clone(),
                delivered: value,
                observers: Vec::new(),
                pending: VecDeque::new(),
                draining: false,
                next_id: 0,
            }),
        }
    }

    pub fn get(&self) -> T {
        self.state.lock().current.clone()
    }

    /// Stores and emits `value` unless it equals the current value.
    ///
    /// Returns `true` if the value changed.
    pub fn set(&self, value: T) -> bool {
        let changed = {
            let _writer = self.writer.lock();
            self.commit(value)
        };
        if changed {
            self.drain();
        }
        changed
    }

    /// Read-modify-write; `f` runs once, with concurrent writers held off.
    ///
    /// Returns the value held once delivery finished, which differs from
    /// `f`'s result if an observer wrote back.
    pub fn modify<F>(&self, mut f: F) -> T
    where
        F: FnMut(&T) -> T,
    {
        let changed = {
            let _writer = self.writer.lock();
            let next = f(&self.get());
            self.commit(next)
        };
        if changed {
            self.drain();
        }
        self.get()
    }

    /// Registers `observer`, which first receives the latest delivered value.
    pub fn subscribe(self: &Arc<Self>, observer: Observer<T>) -> Subscription {
        let id = {
            let mut state = self.state.lock();
            let id = state.next_id;
            state.next_id += 1;
            state
                .pending
                .push_back(Pending::Attach(id, observer));
            id
        };
        self.drain();

        let publisher = Arc::downgrade(self);
        Subscription::new(move || {
            if let Some(publisher) = publisher.upgrade() {
                publisher.unsubscribe(id);
            }
        })
    }

    fn commit(&self, value: T) -> bool {
        let mut state = self.state.lock();
        if state.current == value {
            return false;
        }
        state.current = value.clone();
        state
            .pending
            .push_back(Pending::Emit(value));
        true
    }

    /// Delivers pending work unless another call, on this thread or another, is already doing so.
    fn drain(&self) {
        {
            let mut state = self.state.lock();
            if state.draining {
                return;
            }
            state.draining = true;
        }
        let mut token = DrainToken {
            state: &self.state,
            released: false,
        };

        loop {
            let delivery = {
                let mut state = self.state.lock();
                match state.pending.pop_front() {
                    None => {
                        state.draining = false;
                        break;
                    }
                    Some(Pending::Emit(value)) => {
                        state.delivered = value.clone();
                        let observers = state
                            .observers
                            .iter()
                            .map(|(_, observer)| Arc::clone(observer))
                            .collect();
                        Delivery::Emit(value, observers)
                    }
                    Some(Pending::Attach(id, observer)) => {
                        state
                            .observers
                            .push((id, Arc::clone(&observer)));
                        trace!("Observer subscribed. id: {}, observers: {}", id, state.observers.len());
                        Delivery::Replay(state.delivered.clone(), observer)
                    }
                }
            };

            match delivery {
                Delivery::Emit(value, observers) => {
                    for observer in observers {
                        observer(&value);
                    }
                }
                Delivery::Replay(value, observer) => observer(&value),
            }
        }
        token.released = true;
    }

    fn unsubscribe(&self, id: u64) {
        let mut state = self.state.lock();
        state
            .observers
            .retain(|(observer_id, _)| *observer_id != id);
        state
            .pending
            .retain(|pending| !matches!(pending, Pending::Attach(pending_id, _) if *pending_id == id));
        trace!("Observer unsubscribed. id: {}, observers: {}", id, state.observers.len());
    }

    pub fn observer_count(&self) -> usize {
        self.state.lock().observers.len()
    }
}
