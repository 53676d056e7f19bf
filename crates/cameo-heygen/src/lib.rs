//! HeyGen avatar video generation for Cameo
//!
//! This crate provides the client-side half of the Cameo video lifecycle:
//! submitting a generation job to HeyGen, tracking its asynchronous
//! completion by polling, and the chat-log bookkeeping that attaches a
//! finished video to the message that requested it. Webhook delivery (the
//! faster completion path) lives in `cameo-web`.
//!
//! # Examples
//!
//! ```no_run
//! use cameo_heygen::{AvatarCatalog, GenerationRequest, HeygenClient, JobTracker};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HeygenClient::from_env()?;
//!     let catalog = AvatarCatalog::builtin();
//!     let avatar = catalog.get("gala").expect("known avatar");
//!
//!     let request = GenerationRequest {
//!         avatar_id: avatar.avatar_id.clone(),
//!         voice_id: avatar.voice_id.clone(),
//!         script: "Hello, this is a test video!".to_string(),
//!     };
//!
//!     let tracker = JobTracker::from_config(client.config());
//!     let job = tracker.submit(&client, &request).await?;
//!
//!     let snapshot = tracker.wait_for_completion(&client, &job.id).await?;
//!     println!("Video ready: {:?}", snapshot.video_url);
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod catalog;
pub mod chat;
pub mod config;
pub mod error;
pub mod tracker;
pub mod types;

// Re-export main types
pub use api::HeygenClient;
pub use catalog::{Avatar, AvatarCatalog};
pub use chat::{ChatLog, ChatMessage};
pub use config::HeygenConfig;
pub use error::{HeygenError, Result};
pub use tracker::{JobTracker, PollOutcome, PollState, PollStep, StatusSource};
pub use types::{
    GenerationRequest, Job, JobSnapshot, JobStatus, WEBHOOK_EVENTS, WebhookNotification,
};
