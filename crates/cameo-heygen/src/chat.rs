//! Append-only chat transcript. Messages are never mutated after append,
//! with one exception: a reply awaiting a video gets its URL attached when
//! the corresponding job completes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub text: String,
    pub from_user: bool,
    /// Job this message is waiting on, when it carries a pending video.
    pub job_id: Option<String>,
    pub video_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage {
            text: text.into(),
            from_user: true,
            job_id: None,
            video_url: None,
        });
    }

    /// Append an avatar reply that will carry the video once `job_id`
    /// resolves.
    pub fn push_reply(&mut self, text: impl Into<String>, job_id: impl Into<String>) {
        self.messages.push(ChatMessage {
            text: text.into(),
            from_user: false,
            job_id: Some(job_id.into()),
            video_url: None,
        });
    }

    /// Attach a completed video to the message awaiting `job_id`. Attaches
    /// at most once; returns `false` when no message was waiting.
    pub fn attach_video(&mut self, job_id: &str, url: &str) -> bool {
        for message in &mut self.messages {
            if message.job_id.as_deref() == Some(job_id) && message.video_url.is_none() {
                message.video_url = Some(url.to_string());
                return true;
            }
        }
        false
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }
}
