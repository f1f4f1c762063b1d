use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};

use crate::domain::{Job, JobId};

#[derive(Debug, Default)]
struct StoreState {
    jobs: HashMap<JobId, Job>,
    revision: u64,
    last_refreshed_at: Option<DateTime<Utc>>,
}

/// What a reconciliation changed, for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub revision: u64,
    pub total: usize,
    pub added: usize,
    pub removed: usize,
    pub status_changes: usize,
    pub irregular_transitions: usize,
}

/// Latest known job collection for one client session.
///
/// Each refresh replaces the whole collection in one step, so jobs that
/// vanished from the backend disappear here too.
#[derive(Debug, Default)]
pub struct JobStatusStore {
    state: RwLock<StoreState>,
}

impl JobStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&self, snapshot: Vec<Job>) -> ReconcileSummary {
        let incoming: HashMap<JobId, Job> = snapshot
            .into_iter()
            .map(|job| (job.id.clone(), job))
            .collect();

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        let mut summary = ReconcileSummary {
            total: incoming.len(),
            ..ReconcileSummary::default()
        };
        for (id, job) in &incoming {
            match state.jobs.get(id) {
                None => summary.added += 1,
                Some(previous) if previous.status != job.status => {
                    summary.status_changes += 1;
                    if !previous.status.can_transition_to(&job.status) {
                        summary.irregular_transitions += 1;
                        tracing::warn!(
                            job_id = %id,
                            from = %previous.status,
                            to = %job.status,
                            "Backend reported an irregular status transition"
                        );
                    }
                }
                Some(_) => {}
            }
        }
        summary.removed = state
            .jobs
            .keys()
            .filter(|id| !incoming.contains_key(*id))
            .count();

        state.jobs = incoming;
        state.revision += 1;
        state.last_refreshed_at = Some(Utc::now());
        summary.revision = state.revision;
        summary
    }

    /// Jobs newest first. Jobs without a creation time sort last.
    pub fn jobs(&self) -> Vec<Job> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let mut jobs: Vec<Job> = state.jobs.values().cloned().collect();
        jobs.sort_by(newest_first);
        jobs
    }

    pub fn get(&self, id: &JobId) -> Option<Job> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.jobs.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .jobs
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn revision(&self) -> u64 {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .revision
    }

    pub fn last_refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .last_refreshed_at
    }

    pub fn clear(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.jobs.clear();
        state.revision += 1;
        state.last_refreshed_at = None;
    }
}

fn newest_first(a: &Job, b: &Job) -> Ordering {
    match (a.created_at, b.created_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| b.id.cmp(&a.id))
}
