use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::Result;

/// Knobs for a single text generation request.
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    /// Let the backend ground the answer with web search.
    pub search_grounding: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageOptions {
    pub number_of_images: u32,
    pub mime_type: String,
    pub aspect_ratio: String,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            number_of_images: 1,
            mime_type: "image/jpeg".to_string(),
            aspect_ratio: "16:9".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

#[async_trait]
pub trait InferenceModel: Send + Sync {
    fn name(&self) -> &str;

    /// Run a free-form text prompt and return the raw answer.
    async fn generate_text(&self, prompt: &str, options: &GenerationOptions) -> Result<String>;

    /// Produce images for a prompt. An empty vec means the service declined.
    async fn generate_images(&self, prompt: &str, options: &ImageOptions) -> Result<Vec<GeneratedImage>>;
}
