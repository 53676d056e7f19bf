//! Drives a submitted job from `processing` to a terminal state.
//!
//! Polling is the primary completion signal; webhook delivery (handled by
//! the web crate) is an optional faster path. The poll loop is an explicit
//! state machine over `PollState` rather than a recursive timer callback,
//! so its transitions are testable without timers.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};

use crate::api::HeygenClient;
use crate::config::HeygenConfig;
use crate::error::{HeygenError, Result};
use crate::types::{GenerationRequest, Job, JobSnapshot, JobStatus, WEBHOOK_EVENTS};

/// Anything that can answer a status query for a job id. Implemented by
/// [`HeygenClient`]; tests substitute scripted sources.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn video_status(&self, video_id: &str) -> Result<JobSnapshot>;
}

#[async_trait]
impl StatusSource for HeygenClient {
    async fn video_status(&self, video_id: &str) -> Result<JobSnapshot> {
        HeygenClient::video_status(self, video_id).await
    }
}

/// Accumulated poll-loop state, threaded through each iteration.
#[derive(Debug, Clone, Default)]
pub struct PollState {
    pub attempts: u32,
    pub last: Option<JobSnapshot>,
}

impl PollState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// What one status query produced.
#[derive(Debug)]
pub enum PollOutcome {
    Snapshot(JobSnapshot),
    /// The query failed; the attempt is consumed and the loop retries.
    TransientFailure,
}

/// Where the loop goes next.
#[derive(Debug)]
pub enum PollStep {
    Done(JobSnapshot),
    TimedOut,
    Continue(PollState),
}

/// Advance the poll state machine by one observed outcome.
///
/// Every outcome consumes an attempt, including failures, so a
/// persistently failing remote cannot loop forever. A terminal snapshot
/// wins over the attempt budget being exhausted on the same query.
pub fn step(mut state: PollState, outcome: PollOutcome, max_attempts: u32) -> PollStep {
    state.attempts += 1;
    match outcome {
        PollOutcome::Snapshot(snapshot) => {
            if snapshot.status.is_terminal() {
                return PollStep::Done(snapshot);
            }
            state.last = Some(snapshot);
        }
        PollOutcome::TransientFailure => {}
    }
    if state.attempts >= max_attempts {
        PollStep::TimedOut
    } else {
        PollStep::Continue(state)
    }
}

/// Tracks jobs to completion by polling a [`StatusSource`].
#[derive(Debug, Clone)]
pub struct JobTracker {
    max_attempts: u32,
    poll_interval: Duration,
}

impl JobTracker {
    pub fn new(max_attempts: u32, poll_interval: Duration) -> Self {
        Self {
            max_attempts,
            poll_interval,
        }
    }

    pub fn from_config(config: &HeygenConfig) -> Self {
        Self::new(config.max_poll_attempts, config.poll_interval)
    }

    /// Submit a generation request and register the completion webhook.
    ///
    /// Webhook registration is best-effort: a failure is logged and the
    /// job id is still returned, with polling as the completion signal.
    pub async fn submit(&self, client: &HeygenClient, request: &GenerationRequest) -> Result<Job> {
        let video_id = client.generate(request).await?;

        if let Some(callback_url) = client.config().callback_url.clone() {
            if let Err(err) = client
                .register_webhook(Some(&video_id), &callback_url, WEBHOOK_EVENTS)
                .await
            {
                warn!(
                    "Webhook registration for {} failed ({}), relying on polling",
                    video_id, err
                );
            }
        }

        Ok(Job::new(video_id))
    }

    /// Poll `source` until the job reaches a terminal state or the attempt
    /// budget runs out. Each snapshot is handed to `on_update`; the loop
    /// stops at the first terminal snapshot, so `on_update` never observes
    /// a transition out of `completed` or `failed`.
    ///
    /// Returns `None` when `max_attempts` queries were made without
    /// reaching a terminal state - a distinct outcome from the provider
    /// declaring the job `failed`.
    pub async fn track<F>(
        &self,
        source: &dyn StatusSource,
        video_id: &str,
        mut on_update: F,
    ) -> Option<JobSnapshot>
    where
        F: FnMut(&JobSnapshot),
    {
        if self.max_attempts == 0 {
            return None;
        }

        let mut state = PollState::new();
        loop {
            let outcome = match source.video_status(video_id).await {
                Ok(snapshot) => {
                    on_update(&snapshot);
                    PollOutcome::Snapshot(snapshot)
                }
                Err(HeygenError::Network(err)) => {
                    warn!("Transient status failure for {}: {}", video_id, err);
                    PollOutcome::TransientFailure
                }
                Err(err) => {
                    warn!("Status query for {} failed: {}", video_id, err);
                    PollOutcome::TransientFailure
                }
            };

            match step(state, outcome, self.max_attempts) {
                PollStep::Done(snapshot) => {
                    info!("Video {} reached terminal state {:?}", video_id, snapshot.status);
                    return Some(snapshot);
                }
                PollStep::TimedOut => {
                    warn!(
                        "Gave up on video {} after {} status checks",
                        video_id, self.max_attempts
                    );
                    return None;
                }
                PollStep::Continue(next) => {
                    state = next;
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }

    /// Convenience wrapper over [`track`](Self::track) for callers that
    /// only want the finished video.
    pub async fn wait_for_completion(
        &self,
        source: &dyn StatusSource,
        video_id: &str,
    ) -> Result<JobSnapshot> {
        match self.track(source, video_id, |_| {}).await {
            Some(snapshot) if snapshot.status == JobStatus::Completed => Ok(snapshot),
            Some(snapshot) => Err(HeygenError::GenerationFailed(format!(
                "video {} ended as {:?}",
                snapshot.id, snapshot.status
            ))),
            None => Err(HeygenError::Timeout(self.max_attempts)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn processing(id: &str) -> JobSnapshot {
        JobSnapshot::processing(id)
    }

    fn completed(id: &str, url: &str) -> JobSnapshot {
        JobSnapshot {
            id: id.to_string(),
            video_url: Some(url.to_string()),
            status: JobStatus::Completed,
            created_at: Utc::now(),
        }
    }

    fn failed(id: &str) -> JobSnapshot {
        JobSnapshot {
            id: id.to_string(),
            video_url: None,
            status: JobStatus::Failed,
            created_at: Utc::now(),
        }
    }

    fn network_error() -> HeygenError {
        // An invalid URL makes reqwest produce an error without any I/O.
        let err = reqwest::Client::new().get("http://").build().unwrap_err();
        HeygenError::Network(err)
    }

    struct ScriptedSource {
        responses: Mutex<VecDeque<Result<JobSnapshot>>>,
        queries: AtomicU32,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<JobSnapshot>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                queries: AtomicU32::new(0),
            }
        }

        fn query_count(&self) -> u32 {
            self.queries.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        async fn video_status(&self, _video_id: &str) -> Result<JobSnapshot> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("status queried more times than scripted")
        }
    }

    fn tracker(max_attempts: u32) -> JobTracker {
        JobTracker::new(max_attempts, Duration::ZERO)
    }

    #[test]
    fn step_stops_at_terminal_snapshot() {
        let state = PollState::new();
        match step(state, PollOutcome::Snapshot(completed("v1", "http://x")), 10) {
            PollStep::Done(snapshot) => assert_eq!(snapshot.status, JobStatus::Completed),
            other => panic!("expected Done, got {other:?}"),
        }
    }

    #[test]
    fn step_times_out_at_exactly_max_attempts() {
        let mut state = PollState::new();
        for _ in 0..2 {
            state = match step(state, PollOutcome::Snapshot(processing("v1")), 3) {
                PollStep::Continue(next) => next,
                other => panic!("expected Continue, got {other:?}"),
            };
        }
        assert!(matches!(
            step(state, PollOutcome::Snapshot(processing("v1")), 3),
            PollStep::TimedOut
        ));
    }

    #[test]
    fn step_failure_consumes_an_attempt() {
        let state = PollState::new();
        match step(state, PollOutcome::TransientFailure, 3) {
            PollStep::Continue(next) => assert_eq!(next.attempts, 1),
            other => panic!("expected Continue, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn track_returns_none_after_exactly_max_attempts() {
        let source = ScriptedSource::new(vec![
            Ok(processing("v1")),
            Ok(processing("v1")),
            Ok(processing("v1")),
        ]);

        let result = tracker(3).track(&source, "v1", |_| {}).await;

        assert!(result.is_none());
        assert_eq!(source.query_count(), 3);
    }

    #[tokio::test]
    async fn track_returns_terminal_snapshot_after_two_queries() {
        let source = ScriptedSource::new(vec![
            Ok(processing("v1")),
            Ok(completed("v1", "http://x")),
        ]);

        let mut seen = Vec::new();
        let result = tracker(10)
            .track(&source, "v1", |snapshot| seen.push(snapshot.status))
            .await;

        let snapshot = result.expect("should resolve");
        assert_eq!(snapshot.status, JobStatus::Completed);
        assert_eq!(snapshot.video_url, Some("http://x".to_string()));
        assert_eq!(source.query_count(), 2);
        assert_eq!(seen, vec![JobStatus::Processing, JobStatus::Completed]);
    }

    #[tokio::test]
    async fn no_updates_after_terminal_state() {
        let source = ScriptedSource::new(vec![Ok(failed("v1"))]);

        let mut updates = 0;
        let result = tracker(5)
            .track(&source, "v1", |snapshot| {
                updates += 1;
                assert_eq!(snapshot.status, JobStatus::Failed);
            })
            .await;

        assert_eq!(result.unwrap().status, JobStatus::Failed);
        assert_eq!(updates, 1);
        assert_eq!(source.query_count(), 1);
    }

    #[tokio::test]
    async fn transient_failure_is_swallowed_and_counted() {
        let source = ScriptedSource::new(vec![
            Err(network_error()),
            Ok(completed("v1", "http://x")),
        ]);

        let mut updates = 0;
        let result = tracker(3).track(&source, "v1", |_| updates += 1).await;

        let snapshot = result.expect("should resolve despite one failure");
        assert_eq!(snapshot.status, JobStatus::Completed);
        // The failed query produced no update but consumed an attempt.
        assert_eq!(updates, 1);
        assert_eq!(source.query_count(), 2);
    }

    #[tokio::test]
    async fn persistent_failures_exhaust_the_budget() {
        let source = ScriptedSource::new(vec![
            Err(network_error()),
            Err(network_error()),
        ]);

        let result = tracker(2).track(&source, "v1", |_| {}).await;

        assert!(result.is_none());
        assert_eq!(source.query_count(), 2);
    }

    #[tokio::test]
    async fn zero_attempt_budget_never_queries() {
        let source = ScriptedSource::new(vec![]);
        assert!(tracker(0).track(&source, "v1", |_| {}).await.is_none());
        assert_eq!(source.query_count(), 0);
    }

    #[tokio::test]
    async fn wait_for_completion_maps_outcomes() {
        let source = ScriptedSource::new(vec![Ok(completed("v1", "http://x"))]);
        let snapshot = tracker(3).wait_for_completion(&source, "v1").await.unwrap();
        assert_eq!(snapshot.video_url, Some("http://x".to_string()));

        let source = ScriptedSource::new(vec![Ok(failed("v1"))]);
        assert!(matches!(
            tracker(3).wait_for_completion(&source, "v1").await,
            Err(HeygenError::GenerationFailed(_))
        ));

        let source = ScriptedSource::new(vec![Ok(processing("v1"))]);
        assert!(matches!(
            tracker(1).wait_for_completion(&source, "v1").await,
            Err(HeygenError::Timeout(1))
        ));
    }
}
