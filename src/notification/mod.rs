//! Push notification broadcasting.
//!
//! A [`SubscriberRegistry`] holds the delivery targets, the
//! [`TemplateResolver`] builds payloads, and the [`Broadcaster`] fans a
//! payload out through a [`crate::core::PushDelivery`] backend. The
//! [`EventListener`] drives all of this from inbound events.
pub mod dispatcher;
pub mod http_delivery;
pub mod listener;
pub mod logging_delivery;
pub mod registry;
pub mod templates;

pub use dispatcher::{BroadcastReport, Broadcaster};
pub use http_delivery::HttpDelivery;
pub use listener::{EventListener, InboundEvent};
pub use logging_delivery::LoggingDelivery;
pub use registry::SubscriberRegistry;
pub use templates::{NotificationKind, TemplateResolver};
