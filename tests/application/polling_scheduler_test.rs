use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use scribe_gateway::application::ports::{ClientError, JobSnapshotSource};
use scribe_gateway::domain::Job;
use scribe_gateway::application::services::{JobStatusStore, PollingScheduler, refresh_once};
use scribe_gateway::domain::JobStatus;

use crate::helpers::{ScriptedSource, job};

const LONG_INTERVAL: Duration = Duration::from_secs(3600);

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Source whose fetches take a while and which records peak concurrency.
#[derive(Default)]
struct SlowSource {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

#[async_trait]
impl JobSnapshotSource for SlowSource {
    async fn fetch_jobs(&self) -> Result<Vec<Job>, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(vec![job("1", JobStatus::Transcribing)])
    }
}

#[tokio::test]
async fn given_slow_source_when_ticks_and_manual_refreshes_pile_up_then_fetches_never_overlap() {
    let store = Arc::new(JobStatusStore::new());
    let source = Arc::new(SlowSource::default());

    let handle =
        PollingScheduler::new(source.clone(), store.clone(), Duration::from_millis(5)).start();
    for _ in 0..20 {
        handle.request_refresh();
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    wait_until(|| source.calls.load(Ordering::SeqCst) >= 3).await;
    handle.stop().await;

    assert_eq!(source.peak.load(Ordering::SeqCst), 1);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn given_failing_source_when_refreshing_once_then_store_keeps_previous_snapshot() {
    let store = JobStatusStore::new();
    store.replace(vec![job("1", JobStatus::Transcribing)]);
    let source = ScriptedSource::new(vec![Err(ClientError::Transport("connection reset".into()))]);

    let outcome = refresh_once(&source, &store).await;

    assert!(matches!(outcome, Err(ClientError::Transport(_))));
    assert_eq!(store.len(), 1);
    assert_eq!(store.revision(), 1);
}

#[tokio::test]
async fn given_started_scheduler_when_running_then_first_refresh_is_immediate() {
    let store = Arc::new(JobStatusStore::new());
    let source = Arc::new(ScriptedSource::new(vec![Ok(vec![job("1", JobStatus::Submitted)])]));

    let handle = PollingScheduler::new(source.clone(), store.clone(), LONG_INTERVAL).start();

    wait_until(|| store.len() == 1).await;
    assert_eq!(source.calls(), 1);
    handle.stop().await;
}

#[tokio::test]
async fn given_transport_failure_when_polling_then_loop_keeps_running_and_recovers() {
    let store = Arc::new(JobStatusStore::new());
    let source = Arc::new(ScriptedSource::new(vec![
        Ok(vec![job("1", JobStatus::Submitted)]),
        Err(ClientError::Transport("timeout".into())),
        Ok(vec![job("1", JobStatus::Completed)]),
    ]));

    let handle =
        PollingScheduler::new(source.clone(), store.clone(), Duration::from_millis(20)).start();

    wait_until(|| {
        store
            .jobs()
            .first()
            .is_some_and(|j| j.status == JobStatus::Completed)
    })
    .await;
    assert!(handle.is_running());
    assert!(source.calls() >= 3);
    handle.stop().await;
}

#[tokio::test]
async fn given_expired_session_when_polling_then_loop_stops() {
    let store = Arc::new(JobStatusStore::new());
    let source = Arc::new(ScriptedSource::new(vec![Err(ClientError::SessionExpired)]));

    let handle =
        PollingScheduler::new(source.clone(), store.clone(), Duration::from_millis(10)).start();

    wait_until(|| !handle.is_running()).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn given_refresh_request_when_interval_is_long_then_refresh_happens_early() {
    let store = Arc::new(JobStatusStore::new());
    let source = Arc::new(ScriptedSource::new(vec![
        Ok(vec![]),
        Ok(vec![job("9", JobStatus::Submitted)]),
    ]));

    let handle = PollingScheduler::new(source.clone(), store.clone(), LONG_INTERVAL).start();
    wait_until(|| source.calls() == 1).await;

    handle.request_refresh();

    wait_until(|| store.len() == 1).await;
    assert_eq!(source.calls(), 2);
    handle.stop().await;
}

#[tokio::test]
async fn given_stopped_scheduler_when_time_passes_then_no_further_fetches() {
    let store = Arc::new(JobStatusStore::new());
    let source = Arc::new(ScriptedSource::new(vec![Ok(vec![])]));

    let handle =
        PollingScheduler::new(source.clone(), store.clone(), Duration::from_millis(10)).start();
    wait_until(|| source.calls() >= 1).await;
    handle.stop().await;
    let calls_at_stop = source.calls();

    tokio::time::sleep(Duration::from_millis(60)).await;

    assert_eq!(source.calls(), calls_at_stop);
}
