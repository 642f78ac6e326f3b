//! The notification service, decoupled from the entry point.

use crate::{
    config::{Config, DeliveryKind, NotificationConfig},
    core::{FixedOverdueCount, OverdueSource, PushDelivery},
    notification::{
        Broadcaster, EventListener, HttpDelivery, InboundEvent, LoggingDelivery,
        SubscriberRegistry, TemplateResolver,
    },
    scheduler::Scheduler,
    storage::LocalStorage,
    supervisor::Supervisor,
    sync::SyncService,
    tasks::StoredOverdueCount,
};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

const EVENT_QUEUE_CAPACITY: usize = 256;

/// Builds the delivery backend selected in the configuration.
pub fn build_delivery(config: &NotificationConfig) -> Result<Arc<dyn PushDelivery>> {
    let delivery: Arc<dyn PushDelivery> = match config.delivery {
        DeliveryKind::Logging => Arc::new(LoggingDelivery),
        DeliveryKind::Http => Arc::new(
            HttpDelivery::new(Duration::from_millis(config.http_timeout_ms))
                .context("failed to build HTTP delivery client")?,
        ),
    };
    Ok(delivery)
}

/// A handle to the running service.
pub struct App {
    supervisor: Supervisor,
    broadcaster: Broadcaster,
    resolver: TemplateResolver,
    events_tx: mpsc::Sender<InboundEvent>,
}

impl App {
    /// Creates a new `AppBuilder` to construct an `App`.
    pub fn builder(config: Config) -> AppBuilder {
        AppBuilder::new(config)
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        self.broadcaster.registry()
    }

    pub fn resolver(&self) -> &TemplateResolver {
        &self.resolver
    }

    /// A sender for inbound events. The listener stops when shutdown is
    /// signalled, whether or not senders remain.
    pub fn events_tx(&self) -> mpsc::Sender<InboundEvent> {
        self.events_tx.clone()
    }

    /// Waits for `signal`, then shuts every background task down.
    pub async fn run_until<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        signal.await;
        info!("Shutdown signal received. Waiting for tasks to complete...");
        drop(self.events_tx);

        let panicked = self.supervisor.shutdown().await;
        if !panicked.is_empty() {
            anyhow::bail!("{} tasks panicked: {:?}", panicked.len(), panicked);
        }
        info!("All tasks shut down.");
        Ok(())
    }
}

type ClockFn = Box<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Builder for the service.
///
/// Collaborators can be overridden so tests can observe deliveries and
/// control the clock.
pub struct AppBuilder {
    config: Config,
    delivery_override: Option<Arc<dyn PushDelivery>>,
    overdue_override: Option<Arc<dyn OverdueSource>>,
    clock_override: Option<ClockFn>,
    registry: Option<Arc<SubscriberRegistry>>,
}

impl AppBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            delivery_override: None,
            overdue_override: None,
            clock_override: None,
            registry: None,
        }
    }

    /// Overrides the delivery backend.
    pub fn delivery_override(mut self, delivery: Arc<dyn PushDelivery>) -> Self {
        self.delivery_override = Some(delivery);
        self
    }

    /// Overrides where the overdue count comes from.
    pub fn overdue_override(mut self, source: Arc<dyn OverdueSource>) -> Self {
        self.overdue_override = Some(source);
        self
    }

    /// Overrides the local clock used by the daily summary.
    pub fn clock_override<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> NaiveDateTime + Send + Sync + 'static,
    {
        self.clock_override = Some(Box::new(clock));
        self
    }

    /// Starts with an existing set of subscribers.
    pub fn registry(mut self, registry: Arc<SubscriberRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Builds all components and spawns the background tasks.
    ///
    /// Must be called from within a Tokio runtime.
    #[instrument(skip_all)]
    pub async fn build(self) -> Result<App> {
        let config = self.config;
        config.validate()?;
        let supervisor = Supervisor::new();

        let storage = LocalStorage::open(&config.storage.data_dir).with_context(|| {
            format!(
                "failed to open data directory {}",
                config.storage.data_dir.display()
            )
        })?;

        let delivery = match self.delivery_override {
            Some(delivery) => delivery,
            None => build_delivery(&config.notifications)?,
        };
        debug!(delivery = delivery.name(), "Delivery backend selected");

        let registry = self.registry.unwrap_or_default();
        let broadcaster = Broadcaster::new(registry, delivery);
        let resolver = TemplateResolver::new(config.notifications.icon.clone());

        // Inbound events
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let listener = EventListener::new(broadcaster.clone(), events_rx);
        supervisor.spawn("EventListener", listener.run(supervisor.shutdown_rx()));

        // Recurring reminders
        if config.scheduler.enabled {
            let overdue: Arc<dyn OverdueSource> = match self.overdue_override {
                Some(source) => source,
                None if config.scheduler.count_overdue_tasks => {
                    Arc::new(StoredOverdueCount::new(storage.clone()))
                }
                None => Arc::new(FixedOverdueCount::default()),
            };
            let mut scheduler = Scheduler::new(
                &config.scheduler,
                broadcaster.clone(),
                resolver.clone(),
                overdue,
            )?;
            if let Some(clock) = self.clock_override {
                scheduler = scheduler.with_clock(clock);
            }
            Arc::new(scheduler).start(&supervisor);
        } else {
            info!("Scheduler disabled.");
        }

        // Background task sync
        if config.sync.enabled {
            let sync = Arc::new(SyncService::from_config(storage, &config.sync)?);
            let period = Duration::from_secs(config.sync.interval_seconds);
            supervisor.spawn("AutoSync", sync.run_auto_sync(period, supervisor.shutdown_rx()));
        }

        info!(tasks = supervisor.task_count(), "Notification service started.");
        Ok(App {
            supervisor,
            broadcaster,
            resolver,
            events_tx,
        })
    }
}
