//! Downstream sink for resolved jobs.
//!
//! The webhook handler's only contract is "validate shape, acknowledge,
//! hand off to the sink" - state reconciliation happens here, decoupled
//! from the HTTP response lifecycle. The sink is also where the terminal
//! state invariant is enforced: a stale poll result can arrive after a
//! webhook already resolved the job (or vice versa), and must be ignored.

use async_trait::async_trait;
use cameo_heygen::{Job, JobSnapshot, JobStatus};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// Receives terminal notifications for jobs, from either the webhook
/// receiver or the status proxy.
#[async_trait]
pub trait JobSink: Send + Sync {
    async fn on_job_resolved(&self, video_id: &str, video_url: Option<&str>, status: JobStatus);
}

/// In-memory job registry.
#[derive(Debug, Default)]
pub struct JobStore {
    jobs: HashMap<String, Job>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, job: Job) {
        self.jobs.insert(job.id.clone(), job);
    }

    pub fn get(&self, video_id: &str) -> Option<&Job> {
        self.jobs.get(video_id)
    }

    /// Record a status update for a job, creating the record if the job
    /// was submitted elsewhere (e.g. a webhook for a job this process
    /// never saw). Returns `false` when the job was already terminal and
    /// the update was dropped.
    pub fn update(&mut self, snapshot: &JobSnapshot) -> bool {
        let job = self
            .jobs
            .entry(snapshot.id.clone())
            .or_insert_with(|| Job::new(snapshot.id.clone()));
        job.apply(snapshot)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// Default sink: records the resolution in the shared [`JobStore`] and
/// logs it. No persistence beyond process lifetime.
pub struct StoreSink {
    store: Arc<RwLock<JobStore>>,
}

impl StoreSink {
    pub fn new(store: Arc<RwLock<JobStore>>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl JobSink for StoreSink {
    async fn on_job_resolved(&self, video_id: &str, video_url: Option<&str>, status: JobStatus) {
        let snapshot = JobSnapshot {
            id: video_id.to_string(),
            video_url: video_url.map(|u| u.to_string()),
            status,
            created_at: chrono::Utc::now(),
        };

        let applied = match self.store.write() {
            Ok(mut store) => store.update(&snapshot),
            Err(err) => {
                warn!("Job store lock poisoned, dropping resolution: {}", err);
                return;
            }
        };

        if applied {
            info!(
                "Video {} resolved as {:?} (url: {})",
                video_id,
                status,
                video_url.unwrap_or("none")
            );
        } else {
            debug!("Video {} already terminal, ignoring {:?}", video_id, status);
        }
    }
}
