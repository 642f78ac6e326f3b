//! The set of push subscribers known to this process.

use crate::core::Subscription;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

/// An in-memory set of subscriptions, de-duplicated by value.
///
/// The lock is only held for the duration of a single set operation, never
/// across an `.await`.
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    subscribers: Mutex<HashSet<Subscription>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subscriber. Adding an existing subscriber does nothing.
    pub fn add(&self, subscription: Subscription) {
        let mut subscribers = self.lock();
        subscribers.insert(subscription);
        info!("New subscriber added. Total: {}", subscribers.len());
    }

    /// Removes a subscriber if present.
    ///
    /// Returns `true` if the subscriber was a member.
    pub fn remove(&self, subscription: &Subscription) -> bool {
        let mut subscribers = self.lock();
        let removed = subscribers.remove(subscription);
        info!("Subscriber removed. Total: {}", subscribers.len());
        removed
    }

    pub fn contains(&self, subscription: &Subscription) -> bool {
        self.lock().contains(subscription)
    }

    pub fn size(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copies the current members out of the registry.
    pub fn snapshot(&self) -> Vec<Subscription> {
        self.lock().iter().cloned().collect()
    }

    // A panic while holding the lock cannot leave a HashSet half-modified,
    // so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, HashSet<Subscription>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent() {
        let registry = SubscriberRegistry::new();
        registry.add(Subscription::new("https://push.example.com/1"));
        registry.add(Subscription::new("https://push.example.com/1"));

        assert_eq!(registry.size(), 1);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let registry = SubscriberRegistry::new();
        registry.add(Subscription::new("https://push.example.com/1"));

        let removed = registry.remove(&Subscription::new("https://push.example.com/2"));

        assert!(!removed);
        assert_eq!(registry.size(), 1);
    }

    #[test]
    fn test_remove_present_subscriber() {
        let registry = SubscriberRegistry::new();
        let sub = Subscription::new("https://push.example.com/1");
        registry.add(sub.clone());

        assert!(registry.remove(&sub));
        assert!(!registry.contains(&sub));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_snapshot_is_detached_from_registry() {
        let registry = SubscriberRegistry::new();
        registry.add(Subscription::new("https://push.example.com/1"));
        registry.add(Subscription::new("https://push.example.com/2"));

        let snapshot = registry.snapshot();
        registry.remove(&Subscription::new("https://push.example.com/1"));

        assert_eq!(snapshot.len(), 2);
        assert_eq!(registry.size(), 1);
    }
}
