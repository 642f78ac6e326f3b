//! Consumes inbound notification events and applies them.
//!
//! Events arrive as JSON objects tagged by `type`:
//!
//! ```json
//! {"type": "BROADCAST_NOTIFICATION", "notification": {"title": "...", ...}}
//! {"type": "SUBSCRIBE", "subscription": {"endpoint": "..."}}
//! {"type": "UNSUBSCRIBE", "subscription": {"endpoint": "..."}}
//! ```

use crate::core::{NotificationPayload, Subscription};
use crate::notification::dispatcher::Broadcaster;
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InboundEvent {
    BroadcastNotification { notification: NotificationPayload },
    Subscribe { subscription: Subscription },
    Unsubscribe { subscription: Subscription },
}

impl InboundEvent {
    /// Parses a single JSON-encoded event.
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// Reads one JSON event per line from a blocking reader and forwards it.
///
/// Blank lines are ignored and malformed lines are logged and skipped.
/// Returns when the reader is exhausted or the receiving side is gone.
/// Intended for a dedicated thread, e.g. reading standard input.
pub fn forward_lines<R: BufRead>(reader: R, events_tx: mpsc::Sender<InboundEvent>) -> usize {
    let mut forwarded = 0;
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Failed to read event line");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match InboundEvent::parse(&line) {
            Ok(event) => {
                if events_tx.blocking_send(event).is_err() {
                    debug!("Event channel closed; stopping line reader.");
                    break;
                }
                forwarded += 1;
            }
            Err(e) => warn!(error = %e, "Ignoring malformed event"),
        }
    }
    forwarded
}

/// The listener actor: reads events from a channel until it closes or
/// shutdown is signalled.
pub struct EventListener {
    broadcaster: Broadcaster,
    events_rx: mpsc::Receiver<InboundEvent>,
}

impl EventListener {
    pub fn new(broadcaster: Broadcaster, events_rx: mpsc::Receiver<InboundEvent>) -> Self {
        Self {
            broadcaster,
            events_rx,
        }
    }

    /// Runs the listener's main loop.
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        info!("Notification event listener started.");
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    info!("Event listener received shutdown signal.");
                    break;
                }
                event = self.events_rx.recv() => {
                    match event {
                        Some(event) => self.handle(event).await,
                        None => {
                            info!("Event channel closed. Shutting down event listener.");
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Applies one event.
    pub async fn handle(&self, event: InboundEvent) {
        match event {
            InboundEvent::BroadcastNotification { notification } => {
                let report = self.broadcaster.broadcast(&notification).await;
                debug!(
                    attempted = report.attempted,
                    pruned = report.pruned.len(),
                    "Broadcast event handled"
                );
            }
            InboundEvent::Subscribe { subscription } => {
                self.broadcaster.registry().add(subscription);
            }
            InboundEvent::Unsubscribe { subscription } => {
                self.broadcaster.registry().remove(&subscription);
            }
        }
    }
}
