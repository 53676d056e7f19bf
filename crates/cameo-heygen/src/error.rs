use thiserror::Error;

#[derive(Error, Debug)]
pub enum HeygenError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HeyGen rejected the request: {0}")]
    RemoteRejected(String),

    #[error("invalid generation request: {0}")]
    InvalidRequest(String),

    #[error("video generation failed: {0}")]
    GenerationFailed(String),

    #[error("video generation timed out after {0} status checks")]
    Timeout(u32),
}

pub type Result<T> = std::result::Result<T, HeygenError>;
