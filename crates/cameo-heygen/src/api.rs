use crate::config::HeygenConfig;
use crate::error::{HeygenError, Result};
use crate::types::*;
use chrono::Utc;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct HeygenClient {
    client: Client,
    config: HeygenConfig,
}

impl HeygenClient {
    /// Create a new HeyGen API client with configuration
    pub fn new(config: HeygenConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(HeygenError::Config("HEYGEN_API_KEY is empty".to_string()));
        }

        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;

        Ok(Self { client, config })
    }

    /// Create API client from environment variables
    pub fn from_env() -> Result<Self> {
        let config = HeygenConfig::from_env()?;
        Self::new(config)
    }

    pub fn config(&self) -> &HeygenConfig {
        &self.config
    }

    /// Submit a generation request and return the provider job id.
    ///
    /// When the provider accepts the request but omits an id, a locally
    /// synthesized `video-<millis>` id is returned so the caller always
    /// gets a usable handle. Such ids cannot be correlated with provider
    /// webhooks; polling is the only completion signal for them.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        request.validate()?;

        info!("Submitting video generation for avatar {}", request.avatar_id);

        let url = format!("{}/video/generate", self.config.api_v2_url);
        let payload = GeneratePayload::from_request(request);

        let response = self
            .client
            .post(&url)
            .header("accept", "application/json")
            .header("content-type", "application/json")
            .header("x-api-key", &self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(HeygenError::RemoteRejected(provider_message(&body, status)));
        }

        let value: serde_json::Value = serde_json::from_str(&body).map_err(|_| {
            HeygenError::RemoteRejected("unexpected response shape from video/generate".to_string())
        })?;

        match extract_video_id(&value) {
            Some(video_id) => {
                info!("Video generation started with ID: {}", video_id);
                Ok(video_id)
            }
            None => {
                let fallback = format!("video-{}", Utc::now().timestamp_millis());
                warn!(
                    "Provider response carried no video_id, using fallback {} \
                     (webhooks cannot be correlated with this id)",
                    fallback
                );
                Ok(fallback)
            }
        }
    }

    /// Get the current status of a video
    pub async fn video_status(&self, video_id: &str) -> Result<JobSnapshot> {
        debug!("Checking status for video {}", video_id);

        let url = format!("{}/video_status.get", self.config.api_v1_url);

        let response = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .header("x-api-key", &self.config.api_key)
            .query(&[("video_id", video_id)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(HeygenError::RemoteRejected(provider_message(&body, status)));
        }

        let status_response: VideoStatusResponse = serde_json::from_str(&body).map_err(|_| {
            HeygenError::RemoteRejected(
                "unexpected response shape from video_status.get".to_string(),
            )
        })?;

        Ok(status_response.data.into_snapshot(video_id))
    }

    /// Register a webhook endpoint for completion events.
    ///
    /// This is a secondary side channel; callers that invoke it after a
    /// successful `generate` should log a failure and keep going rather
    /// than discard the job id.
    pub async fn register_webhook(
        &self,
        entity_id: Option<&str>,
        callback_url: &str,
        events: &[&str],
    ) -> Result<()> {
        info!("Registering webhook endpoint {}", callback_url);

        let url = format!("{}/webhook/endpoint.add", self.config.api_v1_url);

        let request = WebhookRegisterRequest {
            entity_id: entity_id.map(|id| id.to_string()),
            url: callback_url.to_string(),
            events: events.iter().map(|e| (*e).to_string()).collect(),
        };

        let response = self
            .client
            .post(&url)
            .header("accept", "application/json")
            .header("content-type", "application/json")
            .header("x-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HeygenError::RemoteRejected(provider_message(&body, status)));
        }

        debug!("Webhook endpoint registered");
        Ok(())
    }
}

/// Pull the human-readable error out of a provider failure body, falling
/// back to the HTTP status when the body is opaque.
fn provider_message(body: &str, status: reqwest::StatusCode) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .or_else(|| value.get("error"))
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| format!("provider returned {}", status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeygenConfig;

    #[test]
    fn empty_api_key_is_a_config_error() {
        let config = HeygenConfig::new(String::new(), None, None, None);
        assert!(matches!(
            HeygenClient::new(config),
            Err(HeygenError::Config(_))
        ));
    }

    #[test]
    fn provider_message_prefers_message_field() {
        let status = reqwest::StatusCode::BAD_REQUEST;
        assert_eq!(
            provider_message(r#"{"message":"quota exceeded"}"#, status),
            "quota exceeded"
        );
        assert_eq!(
            provider_message(r#"{"error":"bad avatar"}"#, status),
            "bad avatar"
        );
        assert_eq!(
            provider_message("not json at all", status),
            "provider returned 400 Bad Request"
        );
    }
}
