//! Core domain types and service traits for taskbell
//!
//! This module defines the notification data structures and the trait
//! contracts that connect the broadcaster to its delivery backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Identifies a push delivery target.
///
/// Two subscriptions are the same subscription when every field matches;
/// there is no assigned identifier. The schema is closed: a descriptor with
/// fields beyond these is rejected rather than silently narrowed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Subscription {
    /// The push service endpoint URL.
    pub endpoint: String,
    /// Encryption keys handed out by the push service, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<SubscriptionKeys>,
    /// Expiration timestamp (milliseconds since epoch) reported by the browser.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<u64>,
}

impl Subscription {
    /// Creates a subscription that only carries an endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Returns the endpoint shortened for log output.
    pub fn short_endpoint(&self) -> String {
        let short: String = self.endpoint.chars().take(50).collect();
        format!("{}...", short)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(deny_unknown_fields)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// A fully resolved notification, ready to be sent to every subscriber.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    /// Path or URL of the icon shown with the notification.
    pub icon: String,
    /// Notifications sharing a tag replace each other on the client.
    pub tag: String,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_interaction: Option<bool>,
}

/// The only failure the broadcaster knows about.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("push endpoint rejected the notification: status {status}")]
    Rejected { status: u16 },

    #[error("push request failed: {0}")]
    Transport(String),
}

// =============================================================================
// Service Traits
// =============================================================================

/// Delivers a payload to a single subscriber.
#[async_trait]
pub trait PushDelivery: Send + Sync {
    /// A short name for logs (e.g., "logging", "http").
    fn name(&self) -> &str;

    /// Attempts one delivery.
    ///
    /// # Returns
    /// * `Ok(())` when the push service accepted the notification
    /// * `Err` for any failure; the caller deregisters the subscriber
    async fn deliver(
        &self,
        subscription: &Subscription,
        payload: &NotificationPayload,
    ) -> Result<(), DeliveryError>;
}

/// Supplies the number of overdue tasks for the hourly reminder.
pub trait OverdueSource: Send + Sync {
    fn overdue_count(&self) -> u64;
}

/// Always reports the same count.
#[derive(Debug, Clone, Copy)]
pub struct FixedOverdueCount(pub u64);

impl Default for FixedOverdueCount {
    fn default() -> Self {
        Self(1)
    }
}

impl OverdueSource for FixedOverdueCount {
    fn overdue_count(&self) -> u64 {
        self.0
    }
}
