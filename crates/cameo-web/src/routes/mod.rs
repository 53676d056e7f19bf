//! API routes for cameo-web

use crate::AppState;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use cameo_heygen::{
    Avatar, GenerationRequest, HeygenError, JobSnapshot, WEBHOOK_EVENTS, WebhookNotification,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Request body for the generate proxy
#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    /// Catalog avatar id (e.g. "gala"), not the provider avatar id
    pub avatar_id: String,
    pub script: String,
}

/// Response body for the generate proxy
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub video_id: String,
}

/// Acknowledgment sent back to the provider for every well-formed or
/// malformed webhook delivery alike.
#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub registered: bool,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn missing_key_error() -> ApiError {
    api_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "HEYGEN_API_KEY is not configured",
    )
}

/// Map client errors onto proxy status codes. The provider saying no is a
/// bad gateway from the UI's point of view; transport trouble is a gateway
/// timeout.
fn map_heygen_error(err: &HeygenError) -> ApiError {
    match err {
        HeygenError::Config(msg) => api_error(StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        HeygenError::InvalidRequest(msg) => api_error(StatusCode::BAD_REQUEST, msg.clone()),
        HeygenError::Network(_) => {
            api_error(StatusCode::GATEWAY_TIMEOUT, "could not reach HeyGen")
        }
        HeygenError::RemoteRejected(msg) | HeygenError::GenerationFailed(msg) => {
            api_error(StatusCode::BAD_GATEWAY, msg.clone())
        }
        HeygenError::Timeout(_) => api_error(StatusCode::GATEWAY_TIMEOUT, err.to_string()),
    }
}

/// Health check endpoint
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Serve the static avatar catalog
async fn list_avatars(State(state): State<AppState>) -> Json<Vec<Avatar>> {
    Json(state.catalog.all().to_vec())
}

/// Submit a generation request on behalf of the UI.
async fn generate(
    State(state): State<AppState>,
    Json(body): Json<GenerateBody>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let avatar = state
        .catalog
        .get(&body.avatar_id)
        .ok_or_else(|| {
            api_error(
                StatusCode::BAD_REQUEST,
                format!("unknown avatar: {}", body.avatar_id),
            )
        })?
        .clone();

    let Some(client) = &state.client else {
        return Err(missing_key_error());
    };

    let request = GenerationRequest {
        avatar_id: avatar.avatar_id,
        voice_id: avatar.voice_id,
        script: body.script,
    };

    let job = state
        .tracker
        .submit(client, &request)
        .await
        .map_err(|err| map_heygen_error(&err))?;

    let video_id = job.id.clone();
    if let Ok(mut jobs) = state.jobs.write() {
        jobs.insert(job);
    }

    Ok(Json(GenerateResponse { video_id }))
}

/// Report the current status of a job, preferring what the webhook
/// receiver already recorded over a fresh provider query.
async fn video_status(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<Json<JobSnapshot>, ApiError> {
    // A webhook may have resolved the job already; no provider call needed.
    if let Ok(jobs) = state.jobs.read()
        && let Some(job) = jobs.get(&video_id)
        && job.status.is_terminal()
    {
        return Ok(Json(job.snapshot()));
    }

    let Some(client) = &state.client else {
        return Err(missing_key_error());
    };

    let snapshot = client
        .video_status(&video_id)
        .await
        .map_err(|err| map_heygen_error(&err))?;

    // A webhook can win the race while the query was in flight; the store
    // keeps the terminal result either way.
    if let Ok(mut jobs) = state.jobs.write()
        && !jobs.update(&snapshot)
        && let Some(job) = jobs.get(&video_id)
    {
        return Ok(Json(job.snapshot()));
    }

    Ok(Json(snapshot))
}

/// Subscribe the configured callback URL to completion events.
async fn register_webhook(
    State(state): State<AppState>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let Some(client) = &state.client else {
        return Err(missing_key_error());
    };

    let Some(callback_url) = client.config().callback_url.clone() else {
        return Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "CAMEO_WEBHOOK_URL is not configured",
        ));
    };

    client
        .register_webhook(None, &callback_url, WEBHOOK_EVENTS)
        .await
        .map_err(|err| map_heygen_error(&err))?;

    Ok(Json(RegisterResponse { registered: true }))
}

/// Inbound webhook deliveries from HeyGen.
///
/// Always acknowledges with 200: a non-2xx here makes the provider retry
/// indefinitely, so malformed payloads and unrecognized events are logged
/// and dropped rather than rejected. Downstream sink outcomes never reach
/// the provider-facing response.
async fn receive_webhook(State(state): State<AppState>, body: Bytes) -> Json<WebhookAck> {
    let ack = Json(WebhookAck { received: true });

    let notification: WebhookNotification = match serde_json::from_slice(&body) {
        Ok(notification) => notification,
        Err(err) => {
            warn!("Discarding malformed webhook payload: {}", err);
            return ack;
        }
    };

    let Some(status) = notification.resolved_status() else {
        debug!("Ignoring webhook event {}", notification.event_type);
        return ack;
    };

    let Some(video_id) = notification.video_id.as_deref() else {
        warn!(
            "Webhook event {} carried no video_id",
            notification.event_type
        );
        return ack;
    };

    state
        .sink
        .on_job_resolved(video_id, notification.video_url.as_deref(), status)
        .await;

    ack
}

pub fn api_routes(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/api/health", get(health))
        // Avatar catalog
        .route("/api/avatars", get(list_avatars))
        // Generation proxy
        .route("/api/generate", post(generate))
        .route("/api/videos/{video_id}", get(video_status))
        // Webhooks
        .route("/api/webhooks/register", post(register_webhook))
        .route("/api/webhooks/heygen", post(receive_webhook))
        .with_state(state)
}
