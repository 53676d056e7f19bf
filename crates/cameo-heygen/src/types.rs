use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{HeygenError, Result};

/// Maximum script length accepted for a single video, in characters.
pub const MAX_SCRIPT_CHARS: usize = 1000;

/// Webhook events subscribed to when registering a callback endpoint.
pub const WEBHOOK_EVENTS: &[&str] = &["video.completed", "video.failed"];

/// One video generation request, as submitted by the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub avatar_id: String,
    pub voice_id: String,
    pub script: String,
}

impl GenerationRequest {
    pub fn validate(&self) -> Result<()> {
        if self.avatar_id.is_empty() {
            return Err(HeygenError::InvalidRequest("avatar_id is empty".to_string()));
        }
        if self.voice_id.is_empty() {
            return Err(HeygenError::InvalidRequest("voice_id is empty".to_string()));
        }
        if self.script.trim().is_empty() {
            return Err(HeygenError::InvalidRequest("script is empty".to_string()));
        }
        let chars = self.script.chars().count();
        if chars > MAX_SCRIPT_CHARS {
            return Err(HeygenError::InvalidRequest(format!(
                "script is {chars} characters, maximum is {MAX_SCRIPT_CHARS}"
            )));
        }
        Ok(())
    }
}

/// Lifecycle state of a video generation job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Point-in-time view of a job: the canonical internal shape every
/// provider response variant is normalized into.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobSnapshot {
    pub id: String,
    pub video_url: Option<String>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
}

impl JobSnapshot {
    pub fn processing(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            video_url: None,
            status: JobStatus::Processing,
            created_at: Utc::now(),
        }
    }
}

/// One tracked video generation job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Processing,
            video_url: None,
            created_at: Utc::now(),
        }
    }

    /// Apply a status update. Returns `false` when the update was ignored
    /// because the job is already terminal - a stale poll response can
    /// arrive after a webhook resolved the job, or vice versa.
    pub fn apply(&mut self, snapshot: &JobSnapshot) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = snapshot.status;
        if snapshot.video_url.is_some() {
            self.video_url = snapshot.video_url.clone();
        }
        true
    }

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            id: self.id.clone(),
            video_url: self.video_url.clone(),
            status: self.status,
            created_at: self.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Provider wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct GeneratePayload {
    pub caption: bool,
    pub dimension: Dimension,
    pub video_inputs: Vec<VideoInput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dimension {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoInput {
    pub character: Character,
    pub voice: VoiceInput,
}

#[derive(Debug, Clone, Serialize)]
pub struct Character {
    #[serde(rename = "type")]
    pub kind: String,
    pub avatar_id: String,
    pub scale: f32,
    pub avatar_style: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoiceInput {
    #[serde(rename = "type")]
    pub kind: String,
    pub voice_id: String,
    pub input_text: String,
}

impl GeneratePayload {
    /// Build the v2 `/video/generate` payload: fixed 720p output, captions
    /// disabled, a single avatar scene speaking the script.
    pub fn from_request(request: &GenerationRequest) -> Self {
        Self {
            caption: false,
            dimension: Dimension {
                width: 1280,
                height: 720,
            },
            video_inputs: vec![VideoInput {
                character: Character {
                    kind: "avatar".to_string(),
                    avatar_id: request.avatar_id.clone(),
                    scale: 1.0,
                    avatar_style: "normal".to_string(),
                },
                voice: VoiceInput {
                    kind: "text".to_string(),
                    voice_id: request.voice_id.clone(),
                    input_text: request.script.clone(),
                },
            }],
        }
    }
}

/// Extract the provider job id from a generate response. Observed client
/// versions disagree on nesting (`data.video_id` vs `data.data.video_id`),
/// so both are accepted.
pub fn extract_video_id(value: &serde_json::Value) -> Option<String> {
    let data = value.get("data")?;
    if let Some(id) = data.get("video_id").and_then(|v| v.as_str()) {
        return Some(id.to_string());
    }
    data.get("data")
        .and_then(|inner| inner.get("video_id"))
        .and_then(|v| v.as_str())
        .map(|id| id.to_string())
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoStatusResponse {
    pub data: VideoStatusData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoStatusData {
    #[serde(default)]
    pub status: Option<String>,
    // Some provider versions say `url`, others `video_url`.
    #[serde(default, alias = "url")]
    pub video_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl VideoStatusData {
    /// Normalize into a snapshot. A missing URL is not an error while the
    /// video is still rendering.
    pub fn into_snapshot(self, video_id: &str) -> JobSnapshot {
        let status = match self.status.as_deref() {
            Some("completed") | Some("success") => JobStatus::Completed,
            Some("pending") | Some("waiting") | Some("processing") | None => JobStatus::Processing,
            Some(_) => JobStatus::Failed,
        };
        JobSnapshot {
            id: video_id.to_string(),
            video_url: self.video_url,
            status,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookRegisterRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    pub url: String,
    pub events: Vec<String>,
}

/// Inbound webhook notification pushed by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookNotification {
    pub event_type: String,
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
}

impl WebhookNotification {
    /// Map the event name to a terminal status. HeyGen's webhook and status
    /// APIs use different event vocabularies, so both are recognized.
    /// Returns `None` for events this system does not act on.
    pub fn resolved_status(&self) -> Option<JobStatus> {
        match self.event_type.as_str() {
            "video.completed" | "avatar_video.success" => Some(JobStatus::Completed),
            "video.failed" | "avatar_video.fail" => Some(JobStatus::Failed),
            _ => None,
        }
    }
}
