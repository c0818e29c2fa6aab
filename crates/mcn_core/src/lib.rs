pub mod error;
pub mod models;
pub mod notify;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use models::{GeneratedImage, GenerationOptions, ImageOptions, InferenceModel};
pub use notify::{Notification, Notifier};
pub use storage::ArticleStorage;
pub use types::{Article, Category, StorySubmission};
