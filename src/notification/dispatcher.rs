//! Fans a payload out to every registered subscriber.

use crate::core::{NotificationPayload, PushDelivery, Subscription};
use crate::notification::registry::SubscriberRegistry;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// What happened during a single broadcast.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BroadcastReport {
    /// Number of delivery attempts made.
    pub attempted: usize,
    /// Number of attempts that succeeded.
    pub delivered: usize,
    /// Subscribers removed because their delivery failed.
    pub pruned: Vec<Subscription>,
}

/// Sends payloads to all members of a [`SubscriberRegistry`].
///
/// Each subscriber gets exactly one attempt per broadcast. A subscriber whose
/// attempt fails is removed from the registry; nothing is retried.
#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<SubscriberRegistry>,
    delivery: Arc<dyn PushDelivery>,
}

impl Broadcaster {
    pub fn new(registry: Arc<SubscriberRegistry>, delivery: Arc<dyn PushDelivery>) -> Self {
        Self { registry, delivery }
    }

    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    /// Delivers `payload` to every current subscriber and waits for all
    /// attempts to settle.
    ///
    /// Individual failures are logged and turn into registry removals; they
    /// are never returned as an error. Callers that only fire and forget can
    /// ignore the report.
    #[instrument(skip_all, fields(title = %payload.title, delivery = self.delivery.name()))]
    pub async fn broadcast(&self, payload: &NotificationPayload) -> BroadcastReport {
        let subscribers = self.registry.snapshot();
        info!("Broadcasting to {} subscribers", subscribers.len());

        let attempts = subscribers.into_iter().map(|subscription| async move {
            match self.delivery.deliver(&subscription, payload).await {
                Ok(()) => {
                    debug!(endpoint = %subscription.short_endpoint(), "Notification delivered");
                    None
                }
                Err(e) => {
                    error!(
                        endpoint = %subscription.short_endpoint(),
                        error = %e,
                        "Failed to send notification to subscriber"
                    );
                    self.registry.remove(&subscription);
                    Some(subscription)
                }
            }
        });

        let results = join_all(attempts).await;

        let attempted = results.len();
        let pruned: Vec<Subscription> = results.into_iter().flatten().collect();
        let report = BroadcastReport {
            attempted,
            delivered: attempted - pruned.len(),
            pruned,
        };
        debug!(?report, "Broadcast settled");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DeliveryError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    // Records every attempt and fails for the configured endpoints.
    #[derive(Default)]
    struct FakeDelivery {
        failing: Vec<String>,
        attempts: Mutex<Vec<String>>,
    }

    impl FakeDelivery {
        fn failing_for(endpoints: &[&str]) -> Self {
            Self {
                failing: endpoints.iter().map(|e| e.to_string()).collect(),
                ..Default::default()
            }
        }

        fn attempts(&self) -> Vec<String> {
            self.attempts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PushDelivery for FakeDelivery {
        fn name(&self) -> &str {
            "fake"
        }

        async fn deliver(
            &self,
            subscription: &Subscription,
            _payload: &NotificationPayload,
        ) -> Result<(), DeliveryError> {
            self.attempts
                .lock()
                .unwrap()
                .push(subscription.endpoint.clone());
            if self.failing.contains(&subscription.endpoint) {
                return Err(DeliveryError::Transport("connection reset".to_string()));
            }
            Ok(())
        }
    }

    fn registry_with(endpoints: &[&str]) -> Arc<SubscriberRegistry> {
        let registry = Arc::new(SubscriberRegistry::new());
        for endpoint in endpoints {
            registry.add(Subscription::new(*endpoint));
        }
        registry
    }

    #[tokio::test]
    async fn test_failing_subscriber_is_pruned() {
        // Arrange
        let registry = registry_with(&["https://a", "https://b", "https://c"]);
        let delivery = Arc::new(FakeDelivery::failing_for(&["https://b"]));
        let broadcaster = Broadcaster::new(registry.clone(), delivery.clone());

        // Act
        let report = broadcaster.broadcast(&NotificationPayload::default()).await;

        // Assert
        assert_eq!(registry.size(), 2);
        assert!(!registry.contains(&Subscription::new("https://b")));
        assert_eq!(delivery.attempts().len(), 3);
        assert_eq!(report.attempted, 3);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.pruned, vec![Subscription::new("https://b")]);
    }

    #[tokio::test]
    async fn test_empty_registry_makes_no_attempts() {
        let registry = Arc::new(SubscriberRegistry::new());
        let delivery = Arc::new(FakeDelivery::default());
        let broadcaster = Broadcaster::new(registry, delivery.clone());

        let report = broadcaster.broadcast(&NotificationPayload::default()).await;

        assert!(delivery.attempts().is_empty());
        assert_eq!(report, BroadcastReport::default());
    }

    #[tokio::test]
    async fn test_all_failures_empty_the_registry() {
        let registry = registry_with(&["https://a", "https://b"]);
        let delivery = Arc::new(FakeDelivery::failing_for(&["https://a", "https://b"]));
        let broadcaster = Broadcaster::new(registry.clone(), delivery);

        let report = broadcaster.broadcast(&NotificationPayload::default()).await;

        assert!(registry.is_empty());
        assert_eq!(report.delivered, 0);
        assert_eq!(report.pruned.len(), 2);
    }
}
