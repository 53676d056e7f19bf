use crate::error::{HeygenError, Result};
use std::env;
use std::time::Duration;

const DEFAULT_API_V1_URL: &str = "https://api.heygen.com/v1";
const DEFAULT_API_V2_URL: &str = "https://api.heygen.com/v2";

#[derive(Debug, Clone)]
pub struct HeygenConfig {
    pub api_key: String,
    pub api_v1_url: String,
    pub api_v2_url: String,
    /// Public URL HeyGen should push completion webhooks to. When unset,
    /// webhook registration is skipped and polling is the only signal.
    pub callback_url: Option<String>,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
}

impl HeygenConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Try to load .env file if it exists (ignore if it doesn't)
        let _ = dotenvy::dotenv();

        let api_key = env::var("HEYGEN_API_KEY")
            .map_err(|_| HeygenError::Config("HEYGEN_API_KEY not set".to_string()))?;

        let callback_url = env::var("CAMEO_WEBHOOK_URL").ok().filter(|s| !s.is_empty());

        let poll_interval_ms = env::var("CAMEO_POLL_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(2000);

        let max_poll_attempts = env::var("CAMEO_MAX_POLL_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(150);

        Ok(Self {
            api_key,
            api_v1_url: DEFAULT_API_V1_URL.to_string(),
            api_v2_url: DEFAULT_API_V2_URL.to_string(),
            callback_url,
            poll_interval: Duration::from_millis(poll_interval_ms),
            max_poll_attempts,
        })
    }

    /// Create a new configuration with explicit values
    pub fn new(
        api_key: String,
        callback_url: Option<String>,
        poll_interval: Option<Duration>,
        max_poll_attempts: Option<u32>,
    ) -> Self {
        Self {
            api_key,
            api_v1_url: DEFAULT_API_V1_URL.to_string(),
            api_v2_url: DEFAULT_API_V2_URL.to_string(),
            callback_url,
            poll_interval: poll_interval.unwrap_or(Duration::from_millis(2000)),
            max_poll_attempts: max_poll_attempts.unwrap_or(150),
        }
    }
}
