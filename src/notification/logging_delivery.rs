//! A delivery backend that only logs what it would send.
//!
//! Useful for local runs and for exercising the broadcast pipeline without a
//! push service. It never fails.

use crate::core::{DeliveryError, NotificationPayload, PushDelivery, Subscription};
use async_trait::async_trait;
use tracing::{info, instrument};

#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingDelivery;

#[async_trait]
impl PushDelivery for LoggingDelivery {
    fn name(&self) -> &str {
        "logging"
    }

    #[instrument(skip_all)]
    async fn deliver(
        &self,
        subscription: &Subscription,
        payload: &NotificationPayload,
    ) -> Result<(), DeliveryError> {
        info!(
            endpoint = %subscription.short_endpoint(),
            notification = ?payload,
            "Sending notification to subscriber"
        );
        Ok(())
    }
}
