use std::sync::Arc;
use mcn_core::{Error, InferenceModel, Result};
use crate::Config;

pub mod dummy;
pub mod gemini;

pub use dummy::DummyModel;
pub use gemini::GeminiModel;

/// Build the backend named on the command line.
pub fn create_model(name: &str, config: Config) -> Result<Arc<dyn InferenceModel>> {
    match name.trim().to_lowercase().as_str() {
        "gemini" | "google" => Ok(Arc::new(GeminiModel::new(config)?)),
        "dummy" | "offline" => Ok(Arc::new(DummyModel::new())),
        other => Err(Error::Inference(format!(
            "Unknown model '{}'. Available models: gemini (default), dummy",
            other
        ))),
    }
}
