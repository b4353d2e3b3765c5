use parking_lot::Mutex;
use tracing::debug;

use super::Subscription;

/// A registry that keeps subscriptions alive and tears them down together.
#[derive(Default, Debug)]
pub struct SubscriptionRegistry {
    subscriptions: Mutex<Vec<Subscription>>,
}

impl SubscriptionRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Registers a subscription with the registry.
    ///
    /// The subscription stays active until [`SubscriptionRegistry::dispose_all`] is called.
    pub fn register(&self, subscription: Subscription) {
        self.subscriptions.lock().push(subscription);
    }

    pub fn len(&self) -> usize {
        self.subscriptions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.lock().is_empty()
    }

    /// Disposes every registered subscription and empties the registry.
    pub fn dispose_all(&self) {
        // taken out first so a teardown may register again without deadlocking
        let subscriptions = std::mem::take(&mut *self.subscriptions.lock());
        debug!("Disposing subscriptions. count: {}", subscriptions.len());
        for subscription in subscriptions {
            subscription.dispose();
        }
    }
}
