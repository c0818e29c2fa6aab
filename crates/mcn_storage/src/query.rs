//! Read-side views over a snapshot of the store.
//!
//! Everything here is a pure function of the article slice so the web layer and the
//! CLI can share it without touching the lock.

use mcn_core::{Article, Category};
use serde::Serialize;

/// Locations that mean "show me everything".
const NATIONWIDE_LOCATIONS: &[&str] = &["canada", "world"];

const HERO_COUNT: usize = 4;
const LATEST_COUNT: usize = 6;
const RELATED_COUNT: usize = 3;

/// Articles for a reader's location.
///
/// When a specific location has no stories at all the full feed is returned
/// instead of an empty page.
pub fn for_location(articles: &[Article], location: &str) -> Vec<Article> {
    let wanted = location.trim().to_lowercase();
    if wanted.is_empty() || NATIONWIDE_LOCATIONS.contains(&wanted.as_str()) {
        return articles.to_vec();
    }

    let local: Vec<Article> = articles
        .iter()
        .filter(|a| a.location.to_lowercase() == wanted)
        .cloned()
        .collect();

    if local.is_empty() {
        tracing::debug!("No articles for location '{}', showing the full feed", location);
        articles.to_vec()
    } else {
        local
    }
}

/// Articles in a category named by the route. Unknown names match nothing.
pub fn by_category(articles: &[Article], name: &str) -> Vec<Article> {
    match name.parse::<Category>() {
        Ok(category) => articles.iter().filter(|a| a.category == category).cloned().collect(),
        Err(_) => Vec::new(),
    }
}

/// Case-insensitive substring match on title and description.
pub fn search(articles: &[Article], query: &str) -> Vec<Article> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    articles
        .iter()
        .filter(|a| a.title.to_lowercase().contains(&needle) || a.description.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

pub fn related(articles: &[Article], article: &Article) -> Vec<Article> {
    articles
        .iter()
        .filter(|a| a.category == article.category && a.id != article.id)
        .take(RELATED_COUNT)
        .cloned()
        .collect()
}

pub fn from_same_source(articles: &[Article], article: &Article) -> Vec<Article> {
    articles
        .iter()
        .filter(|a| a.source == article.source && a.id != article.id)
        .take(RELATED_COUNT)
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct ArticleDetail {
    pub article: Article,
    pub related: Vec<Article>,
    pub same_source: Vec<Article>,
}

pub fn detail(articles: &[Article], id: &str) -> Option<ArticleDetail> {
    let article = articles.iter().find(|a| a.id == id)?;
    Some(ArticleDetail {
        article: article.clone(),
        related: related(articles, article),
        same_source: from_same_source(articles, article),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct HomePage {
    pub hero: Vec<Article>,
    pub latest: Vec<Article>,
}

pub fn home(feed: &[Article]) -> HomePage {
    HomePage {
        hero: feed.iter().take(HERO_COUNT).cloned().collect(),
        latest: feed.iter().take(LATEST_COUNT).cloned().collect(),
    }
}
