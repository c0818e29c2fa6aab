use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Stock-photo generators used by seed data before a real cover exists.
const PLACEHOLDER_IMAGE_HOSTS: &[&str] = &["placehold.co", "picsum.photos"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Local,
    Canada,
    World,
    Business,
    Technology,
    Sports,
    Entertainment,
    Health,
    Science,
    Politics,
    Indigenous,
    #[default]
    General,
}

impl Category {
    /// Display order used by navigation and the submission form.
    pub const ALL: [Category; 12] = [
        Category::Local,
        Category::Canada,
        Category::World,
        Category::Business,
        Category::Technology,
        Category::Sports,
        Category::Entertainment,
        Category::Health,
        Category::Science,
        Category::Politics,
        Category::Indigenous,
        Category::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Local => "local",
            Category::Canada => "canada",
            Category::World => "world",
            Category::Business => "business",
            Category::Technology => "technology",
            Category::Sports => "sports",
            Category::Entertainment => "entertainment",
            Category::Health => "health",
            Category::Science => "science",
            Category::Politics => "politics",
            Category::Indigenous => "indigenous",
            Category::General => "general",
        }
    }

    /// `general` and `local` are assigned by the app itself, never requested from the model.
    pub fn is_requestable(&self) -> bool {
        !matches!(self, Category::General | Category::Local)
    }

    pub fn requestable() -> Vec<Category> {
        Self::ALL.into_iter().filter(Category::is_requestable).collect()
    }

    /// `general` is reserved for machine-sourced stories.
    pub fn is_user_selectable(&self) -> bool {
        *self != Category::General
    }

    pub fn user_selectable() -> Vec<Category> {
        Self::ALL.into_iter().filter(Category::is_user_selectable).collect()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown category: {}", s)))
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub image: Option<String>,
    pub published: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub fetched_at: DateTime<Utc>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl Article {
    /// True while the article has no real cover image yet.
    pub fn needs_image(&self) -> bool {
        match self.image.as_deref() {
            None => true,
            Some(image) if image.trim().is_empty() => true,
            Some(image) => PLACEHOLDER_IMAGE_HOSTS.iter().any(|host| image.contains(host)),
        }
    }

    pub fn has_web_url(&self) -> bool {
        self.url.starts_with("http://") || self.url.starts_with("https://")
    }
}

/// Seed bundles are not consistent about ids being strings.
fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    })
}

/// A story typed in by a reader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorySubmission {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default = "default_submission_category")]
    pub category: Category,
}

fn default_submission_category() -> Category {
    Category::Local
}
