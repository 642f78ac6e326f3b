//! Fakes shared by unit and integration tests.

use crate::core::{DeliveryError, NotificationPayload, PushDelivery, Subscription};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// A delivery backend that records every attempt and fails for chosen
/// endpoints.
#[derive(Clone, Default)]
pub struct RecordingDelivery {
    failing: Arc<Mutex<HashSet<String>>>,
    sent: Arc<Mutex<Vec<(Subscription, NotificationPayload)>>>,
    notifier: Arc<Notify>,
}

impl RecordingDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every future delivery to `endpoint` fail.
    pub fn fail_for(&self, endpoint: &str) {
        self.failing.lock().unwrap().insert(endpoint.to_string());
    }

    pub fn sent(&self) -> Vec<(Subscription, NotificationPayload)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_titles(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .map(|(_, payload)| payload.title)
            .collect()
    }

    /// Waits until at least `count` attempts were recorded.
    ///
    /// # Panics
    /// Panics if `timeout` elapses first.
    pub async fn wait_for_attempts(&self, count: usize, timeout: Duration) {
        let wait = async {
            loop {
                let notified = self.notifier.notified();
                if self.sent.lock().unwrap().len() >= count {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, wait)
            .await
            .expect("Timed out waiting for deliveries");
    }
}

#[async_trait]
impl PushDelivery for RecordingDelivery {
    fn name(&self) -> &str {
        "recording"
    }

    async fn deliver(
        &self,
        subscription: &Subscription,
        payload: &NotificationPayload,
    ) -> Result<(), DeliveryError> {
        self.sent
            .lock()
            .unwrap()
            .push((subscription.clone(), payload.clone()));
        self.notifier.notify_waiters();

        if self.failing.lock().unwrap().contains(&subscription.endpoint) {
            return Err(DeliveryError::Transport("simulated failure".to_string()));
        }
        Ok(())
    }
}
