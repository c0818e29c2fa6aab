use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Seed error: {0}")]
    Seed(String),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

/// Markers the generative services put in saturation errors.
const RATE_LIMIT_MARKERS: &[&str] = &["429", "RESOURCE_EXHAUSTED"];

impl Error {
    /// True when the failure means the remote service is saturated rather than broken.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Error::RateLimited(_) => true,
            Error::Api { status: 429, .. } => true,
            Error::Http(e) if e.status().map(|s| s.as_u16()) == Some(429) => true,
            other => {
                let message = other.to_string();
                RATE_LIMIT_MARKERS.iter().any(|marker| message.contains(marker))
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
