use mcn_core::{Article, Error, Result};
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

pub const SEED_LOAD_ERROR: &str = "Failed to load initial news content. Please ensure 'articles.json' is available.";

/// Where the startup bundle comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedSource {
    File(PathBuf),
    Url(Url),
}

impl FromStr for SeedSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidInput("Seed location is empty".to_string()));
        }
        if s.starts_with("http://") || s.starts_with("https://") {
            let url = Url::parse(s).map_err(|e| Error::InvalidUrl(format!("{}: {}", s, e)))?;
            return Ok(SeedSource::Url(url));
        }
        Ok(SeedSource::File(PathBuf::from(s)))
    }
}

impl fmt::Display for SeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedSource::File(path) => write!(f, "{}", path.display()),
            SeedSource::Url(url) => write!(f, "{}", url),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SeedBundle {
    #[serde(default)]
    articles: Vec<Article>,
}

/// Reads the static article bundle once at startup.
#[derive(Debug, Clone, Default)]
pub struct SeedLoader {
    client: Client,
}

impl SeedLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub async fn load(&self, source: &SeedSource) -> Result<Vec<Article>> {
        let body = match source {
            SeedSource::File(path) => tokio::fs::read_to_string(path).await?,
            SeedSource::Url(url) => {
                let response = self.client.get(url.clone()).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(Error::Seed(format!("HTTP error! status: {}", status.as_u16())));
                }
                response.text().await?
            }
        };

        let bundle: SeedBundle = serde_json::from_str(&body)?;
        tracing::info!("📦 Loaded {} seed articles from {}", bundle.articles.len(), source);
        Ok(bundle.articles)
    }
}
