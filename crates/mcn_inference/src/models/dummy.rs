use std::fmt;
use serde_json::json;
use mcn_core::{GeneratedImage, GenerationOptions, ImageOptions, InferenceModel, Result};

/// Smallest well-formed JPEG: SOI followed by EOI.
const BLANK_JPEG: [u8; 4] = [0xFF, 0xD8, 0xFF, 0xD9];

/// Offline backend. Answers every news prompt with the same fenced batch, so the
/// first refresh adds stories and later ones report that the feed is current.
pub struct DummyModel {
    stories: serde_json::Value,
}

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self {
            stories: json!([
                {
                    "title": "Offline desk: transit funding vote scheduled",
                    "description": "A placeholder story produced without a network connection so the refresh cycle can be exercised end to end.",
                    "url": "https://example.com/offline/transit-funding",
                    "source": "Offline Desk",
                    "category": "politics"
                },
                {
                    "title": "Offline desk: community hockey league expands",
                    "description": "Another placeholder story used when the generative service is not configured.",
                    "url": "https://example.com/offline/hockey-league",
                    "source": "Offline Desk",
                    "category": "sports"
                }
            ]),
        }
    }

    pub fn with_stories(stories: serde_json::Value) -> Self {
        Self { stories }
    }
}

impl Default for DummyModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl InferenceModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn generate_text(&self, _prompt: &str, _options: &GenerationOptions) -> Result<String> {
        let body = serde_json::to_string_pretty(&self.stories)?;
        Ok(format!("Here are the latest stories.\n```json\n{}\n```\nLet me know if you need more.", body))
    }

    async fn generate_images(&self, _prompt: &str, options: &ImageOptions) -> Result<Vec<GeneratedImage>> {
        let count = options.number_of_images.max(1) as usize;
        Ok(vec![
            GeneratedImage {
                bytes: BLANK_JPEG.to_vec(),
                mime_type: "image/jpeg".to_string(),
            };
            count
        ])
    }
}
