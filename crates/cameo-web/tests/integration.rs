//! Integration tests for cameo-web
//!
//! Exercises the webhook receiver end to end: acknowledgment behavior,
//! downstream sink delivery, and the terminal-state guarantees shared
//! between the webhook path and the status proxy.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use cameo_heygen::{AvatarCatalog, JobSnapshot, JobStatus, JobTracker};
use cameo_web::sink::{JobSink, JobStore, StoreSink};
use cameo_web::{AppState, create_app_with_state};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tower::ServiceExt;

/// Sink that records every resolution it receives.
#[derive(Default)]
struct RecordingSink {
    resolutions: Mutex<Vec<(String, Option<String>, JobStatus)>>,
}

impl RecordingSink {
    fn resolutions(&self) -> Vec<(String, Option<String>, JobStatus)> {
        self.resolutions.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobSink for RecordingSink {
    async fn on_job_resolved(&self, video_id: &str, video_url: Option<&str>, status: JobStatus) {
        self.resolutions.lock().unwrap().push((
            video_id.to_string(),
            video_url.map(|u| u.to_string()),
            status,
        ));
    }
}

fn create_test_server(sink: Arc<dyn JobSink>) -> (axum::Router, Arc<RwLock<JobStore>>) {
    let jobs = Arc::new(RwLock::new(JobStore::new()));
    let state = AppState {
        client: None,
        catalog: Arc::new(AvatarCatalog::builtin()),
        tracker: JobTracker::new(3, Duration::ZERO),
        jobs: jobs.clone(),
        sink,
    };
    (create_app_with_state(state), jobs)
}

fn webhook_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/webhooks/heygen")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn completion_event_reaches_sink_exactly_once() {
    let sink = Arc::new(RecordingSink::default());
    let (app, _) = create_test_server(sink.clone());

    let response = app
        .oneshot(webhook_request(
            r#"{"event_type":"video.completed","video_id":"v1","video_url":"http://x"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        sink.resolutions(),
        vec![(
            "v1".to_string(),
            Some("http://x".to_string()),
            JobStatus::Completed
        )]
    );
}

#[tokio::test]
async fn legacy_event_name_reaches_sink() {
    let sink = Arc::new(RecordingSink::default());
    let (app, _) = create_test_server(sink.clone());

    let response = app
        .oneshot(webhook_request(
            r#"{"event_type":"avatar_video.success","video_id":"v2","video_url":"http://y"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(sink.resolutions().len(), 1);
    assert_eq!(sink.resolutions()[0].2, JobStatus::Completed);
}

#[tokio::test]
async fn failure_event_reaches_sink_without_url() {
    let sink = Arc::new(RecordingSink::default());
    let (app, _) = create_test_server(sink.clone());

    let response = app
        .oneshot(webhook_request(
            r#"{"event_type":"video.failed","video_id":"v3"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        sink.resolutions(),
        vec![("v3".to_string(), None, JobStatus::Failed)]
    );
}

#[tokio::test]
async fn malformed_body_yields_200_and_no_sink_call() {
    let sink = Arc::new(RecordingSink::default());
    let (app, _) = create_test_server(sink.clone());

    let response = app.oneshot(webhook_request("{{{{")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let ack: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(ack["received"], serde_json::json!(true));
    assert!(sink.resolutions().is_empty());
}

#[tokio::test]
async fn unknown_event_yields_200_and_no_sink_call() {
    let sink = Arc::new(RecordingSink::default());
    let (app, _) = create_test_server(sink.clone());

    let response = app
        .oneshot(webhook_request(
            r#"{"event_type":"credits.low","video_id":"v1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(sink.resolutions().is_empty());
}

#[tokio::test]
async fn event_without_video_id_yields_200_and_no_sink_call() {
    let sink = Arc::new(RecordingSink::default());
    let (app, _) = create_test_server(sink.clone());

    let response = app
        .oneshot(webhook_request(r#"{"event_type":"video.completed"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(sink.resolutions().is_empty());
}

#[tokio::test]
async fn webhook_then_status_round_trip() {
    let jobs = Arc::new(RwLock::new(JobStore::new()));
    let state = AppState {
        client: None,
        catalog: Arc::new(AvatarCatalog::builtin()),
        tracker: JobTracker::new(3, Duration::ZERO),
        jobs: jobs.clone(),
        sink: Arc::new(StoreSink::new(jobs.clone())),
    };
    let app = create_app_with_state(state);

    let response = app
        .clone()
        .oneshot(webhook_request(
            r#"{"event_type":"video.completed","video_id":"v1","video_url":"http://x"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(jobs.read().unwrap().len(), 1);

    // The status proxy answers from the store without an API key.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/videos/v1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let snapshot: JobSnapshot = serde_json::from_slice(&body).unwrap();
    assert_eq!(snapshot.id, "v1");
    assert_eq!(snapshot.status, JobStatus::Completed);
    assert_eq!(snapshot.video_url, Some("http://x".to_string()));
}

#[tokio::test]
async fn duplicate_webhook_deliveries_keep_first_terminal_state() {
    let jobs = Arc::new(RwLock::new(JobStore::new()));
    let state = AppState {
        client: None,
        catalog: Arc::new(AvatarCatalog::builtin()),
        tracker: JobTracker::new(3, Duration::ZERO),
        jobs: jobs.clone(),
        sink: Arc::new(StoreSink::new(jobs.clone())),
    };
    let app = create_app_with_state(state);

    for body in [
        r#"{"event_type":"video.completed","video_id":"v1","video_url":"http://x"}"#,
        r#"{"event_type":"video.failed","video_id":"v1"}"#,
    ] {
        let response = app.clone().oneshot(webhook_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let store = jobs.read().unwrap();
    let job = store.get("v1").unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.video_url, Some("http://x".to_string()));
}
