//! A delivery backend that POSTs the payload to the subscription endpoint.
//!
//! This speaks plain JSON over HTTP. It does not implement Web Push message
//! encryption, so it only works against endpoints that accept unencrypted
//! payloads (relays, webhooks, test servers).

use crate::core::{DeliveryError, NotificationPayload, PushDelivery, Subscription};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{error, instrument, trace};

pub struct HttpDelivery {
    client: reqwest::Client,
}

impl HttpDelivery {
    /// Creates a client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PushDelivery for HttpDelivery {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip_all, fields(endpoint = %subscription.short_endpoint()))]
    async fn deliver(
        &self,
        subscription: &Subscription,
        payload: &NotificationPayload,
    ) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&subscription.endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP request to push endpoint failed");
                DeliveryError::Transport(e.to_string())
            })?;

        let status = response.status();
        if status.is_success() {
            trace!(%status, "Push endpoint accepted notification");
            Ok(())
        } else {
            let text = response.text().await.unwrap_or_default();
            error!(status = %status, body = %text, "Push endpoint rejected notification");
            Err(DeliveryError::Rejected {
                status: status.as_u16(),
            })
        }
    }
}
