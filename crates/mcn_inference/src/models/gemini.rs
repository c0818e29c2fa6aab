use std::fmt;
use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;
use mcn_core::{Error, GeneratedImage, GenerationOptions, ImageOptions, InferenceModel, Result};
use crate::Config;

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Google Generative Language REST backend: Gemini for text, Imagen for covers.
pub struct GeminiModel {
    client: Client,
    api_key: String,
    base_url: Url,
    text_model: String,
    image_model: String,
}

impl GeminiModel {
    pub fn new(config: Config) -> Result<Self> {
        let api_key = config
            .api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Inference("Gemini API key is required".to_string()))?;

        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", config.base_url, e)))?;

        Ok(Self {
            client: Client::new(),
            api_key,
            base_url,
            text_model: config.text_model,
            image_model: config.image_model,
        })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url.as_str().trim_end_matches('/'), model, method)
    }

    async fn post(&self, endpoint: String, body: &impl Serialize) -> Result<Response> {
        let response = self
            .client
            .post(endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiErrorEnvelope>(&body) {
            Ok(envelope) if !envelope.error.status.is_empty() => {
                format!("{}: {}", envelope.error.status, envelope.error.message)
            }
            Ok(envelope) => envelope.error.message,
            Err(_) => body,
        };
        tracing::warn!("Gemini API returned {}: {}", status, message);

        if status.as_u16() == 429 {
            return Err(Error::RateLimited(message));
        }
        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }
}

impl fmt::Debug for GeminiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url.as_str())
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .finish()
    }
}

#[async_trait]
impl InferenceModel for GeminiModel {
    fn name(&self) -> &str {
        "Gemini"
    }

    async fn generate_text(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            tools: if options.search_grounding {
                vec![json!({ "google_search": {} })]
            } else {
                Vec::new()
            },
        };

        let response = self
            .post(self.endpoint(&self.text_model, "generateContent"), &request)
            .await?
            .json::<GenerateContentResponse>()
            .await?;

        let text: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(Error::Inference("Gemini returned no text".to_string()));
        }
        Ok(text)
    }

    async fn generate_images(&self, prompt: &str, options: &ImageOptions) -> Result<Vec<GeneratedImage>> {
        let request = json!({
            "instances": [{ "prompt": prompt }],
            "parameters": {
                "sampleCount": options.number_of_images,
                "aspectRatio": options.aspect_ratio,
                "outputOptions": { "mimeType": options.mime_type },
            },
        });

        let response = self
            .post(self.endpoint(&self.image_model, "predict"), &request)
            .await?
            .json::<PredictResponse>()
            .await?;

        let engine = base64::engine::general_purpose::STANDARD;
        let mut images = Vec::with_capacity(response.predictions.len());
        for prediction in response.predictions {
            let Some(encoded) = prediction.bytes_base64_encoded else {
                continue;
            };
            let bytes = engine
                .decode(encoded.as_bytes())
                .map_err(|e| Error::Inference(format!("Invalid image payload: {}", e)))?;
            images.push(GeneratedImage {
                bytes,
                mime_type: prediction.mime_type.unwrap_or_else(|| options.mime_type.clone()),
            });
        }
        Ok(images)
    }
}
