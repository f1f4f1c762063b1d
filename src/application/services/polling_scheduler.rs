use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::application::ports::{ClientError, JobSnapshotSource};

use super::{JobStatusStore, ReconcileSummary};

/// Default cadence between job refreshes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Fetches one snapshot and, only if that succeeds, replaces the store.
pub async fn refresh_once(
    source: &dyn JobSnapshotSource,
    store: &JobStatusStore,
) -> Result<ReconcileSummary, ClientError> {
    let jobs = source.fetch_jobs().await?;
    let summary = store.replace(jobs);
    tracing::debug!(
        revision = summary.revision,
        total = summary.total,
        added = summary.added,
        removed = summary.removed,
        status_changes = summary.status_changes,
        "Job store refreshed"
    );
    Ok(summary)
}

pub struct PollingScheduler {
    source: Arc<dyn JobSnapshotSource>,
    store: Arc<JobStatusStore>,
    interval: Duration,
}

impl PollingScheduler {
    pub fn new(
        source: Arc<dyn JobSnapshotSource>,
        store: Arc<JobStatusStore>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            store,
            interval,
        }
    }

    /// Refreshes immediately, then once per interval, until stopped.
    ///
    /// Refreshes run one after another on a single task, so two polls for the
    /// same session never overlap. Ticks that fall due during a slow refresh
    /// are skipped. A failed refresh keeps the previous store contents; an
    /// expired session ends the loop.
    pub fn start(self) -> PollingHandle {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let refresh_requested = Arc::new(Notify::new());
        let wakeup = Arc::clone(&refresh_requested);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    _ = wakeup.notified() => ticker.reset(),
                    _ = ticker.tick() => {},
                }

                let outcome = tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    outcome = refresh_once(self.source.as_ref(), &self.store) => outcome,
                };

                match outcome {
                    Ok(_) => {}
                    Err(ClientError::SessionExpired) => {
                        tracing::info!("Session expired, job polling stopped");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Job refresh failed, keeping previous snapshot");
                    }
                }
            }
            tracing::debug!("Job polling loop exited");
        });

        PollingHandle {
            stop_tx: Some(stop_tx),
            task: Some(task),
            refresh_requested,
        }
    }
}

/// Owner of a running polling loop. Dropping it stops the loop.
pub struct PollingHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    refresh_requested: Arc<Notify>,
}

impl PollingHandle {
    /// Asks for a refresh ahead of the next tick. Requests made while one is
    /// already pending collapse into that one.
    pub fn request_refresh(&self) {
        self.refresh_requested.notify_one();
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stops the loop and waits for it to exit.
    pub async fn stop(mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Job polling task join failed");
            }
        }
    }
}

impl Drop for PollingHandle {
    fn drop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
