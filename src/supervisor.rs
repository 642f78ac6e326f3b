//! Owns every background task and the shutdown signal they listen to.
use futures::future::join_all;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

type NamedHandle = (&'static str, JoinHandle<()>);

/// Spawns named tasks and shuts them down together.
///
/// Tasks receive a `watch::Receiver<bool>` via [`Supervisor::shutdown_rx`]
/// and are expected to exit once it flips to `true`.
#[derive(Clone, Debug)]
pub struct Supervisor {
    handles: Arc<Mutex<Vec<NamedHandle>>>,
    shutdown_tx: Arc<watch::Sender<bool>>,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Supervisor {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            handles: Arc::new(Mutex::new(Vec::new())),
            shutdown_tx: Arc::new(shutdown_tx),
        }
    }

    /// Spawns `future` on the runtime and tracks it under `name`.
    pub fn spawn<F>(&self, name: &'static str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        debug!(task_name = name, "Spawning task");
        let handle = tokio::spawn(future);
        self.lock_handles().push((name, handle));
    }

    pub fn shutdown_rx(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    pub fn task_count(&self) -> usize {
        self.lock_handles().len()
    }

    /// Signals shutdown and waits for every tracked task.
    ///
    /// Returns the names of tasks that panicked.
    pub async fn shutdown(self) -> Vec<&'static str> {
        // send_replace never fails, even with no receivers left.
        self.shutdown_tx.send_replace(true);

        let handles: Vec<NamedHandle> = self.lock_handles().drain(..).collect();
        info!(
            "Supervisor shutting down. Waiting for {} tasks to complete...",
            handles.len()
        );

        let (names, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        let results = join_all(handles).await;

        let mut panicked = Vec::new();
        for (name, result) in names.into_iter().zip(results) {
            match result {
                Ok(()) => debug!(task_name = name, "Task shut down gracefully."),
                Err(e) => {
                    error!(task_name = name, error = %e, "Task panicked during shutdown.");
                    panicked.push(name);
                }
            }
        }

        if panicked.is_empty() {
            info!("All tasks shut down gracefully.");
        }
        panicked
    }

    fn lock_handles(&self) -> std::sync::MutexGuard<'_, Vec<NamedHandle>> {
        self.handles
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_stops_listening_tasks() {
        let supervisor = Supervisor::new();
        let mut shutdown_rx = supervisor.shutdown_rx();
        supervisor.spawn("waiter", async move {
            let _ = shutdown_rx.changed().await;
        });
        assert_eq!(supervisor.task_count(), 1);

        let panicked = supervisor.shutdown().await;

        assert!(panicked.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_reports_panicked_tasks() {
        let supervisor = Supervisor::new();
        supervisor.spawn("boom", async {
            panic!("task failure");
        });

        let panicked = supervisor.shutdown().await;

        assert_eq!(panicked, vec!["boom"]);
    }
}
