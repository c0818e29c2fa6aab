use async_trait::async_trait;
use mcn_core::{Article, ArticleStorage, Error, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

/// The ordered article list behind [`MemoryStorage`]. Front of the vec is the top of the feed.
#[derive(Debug, Default)]
pub struct MemoryStore {
    articles: Vec<Article>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_initial(&mut self, articles: Vec<Article>) -> bool {
        if !self.articles.is_empty() {
            return false;
        }

        let mut seen = HashSet::new();
        self.articles = articles
            .into_iter()
            .filter_map(|mut article| {
                if !seen.insert(article.id.clone()) {
                    tracing::warn!("Dropping seed article with duplicate id '{}'", article.id);
                    return None;
                }
                ensure_url(&mut article);
                Some(article)
            })
            .collect();
        true
    }

    pub fn merge_new(&mut self, candidates: Vec<Article>) -> Vec<Article> {
        let mut urls: HashSet<String> = self.articles.iter().map(|a| a.url.clone()).collect();
        let mut ids: HashSet<String> = self.articles.iter().map(|a| a.id.clone()).collect();

        let accepted: Vec<Article> = candidates
            .into_iter()
            .filter_map(|mut candidate| {
                if !urls.insert(candidate.url.clone()) {
                    return None;
                }
                if ids.contains(&candidate.id) {
                    let fresh = unused_id(&candidate.id, &ids);
                    tracing::warn!("Article id '{}' already taken, storing as '{}'", candidate.id, fresh);
                    candidate.id = fresh;
                }
                ids.insert(candidate.id.clone());
                Some(candidate)
            })
            .collect();

        if !accepted.is_empty() {
            let existing = std::mem::take(&mut self.articles);
            self.articles = accepted.iter().cloned().chain(existing).collect();
        }
        accepted
    }

    pub fn attach_image(&mut self, id: &str, image: String) -> bool {
        match self.articles.iter_mut().find(|a| a.id == id) {
            Some(article) if article.needs_image() => {
                article.image = Some(image);
                true
            }
            _ => false,
        }
    }

    pub fn append(&mut self, mut article: Article) -> Result<()> {
        if self.articles.iter().any(|a| a.id == article.id) {
            return Err(Error::Storage(format!("Article id '{}' already exists", article.id)));
        }
        ensure_url(&mut article);
        self.articles.insert(0, article);
        Ok(())
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }
}

/// First `<id>-<n>` not present in `taken`.
fn unused_id(id: &str, taken: &HashSet<String>) -> String {
    (1..)
        .map(|n| format!("{}-{}", id, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| id.to_string())
}

/// Stored urls are never empty; fall back to a local anchor.
fn ensure_url(article: &mut Article) {
    if article.url.trim().is_empty() {
        article.url = format!("#{}", article.id);
    }
}

/// Session-scoped content store shared between the pipeline, the backfill worker
/// and the presentation layer.
#[derive(Clone)]
pub struct MemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
    revision: Arc<watch::Sender<u64>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            store: Arc::new(RwLock::new(MemoryStore::new())),
            revision: Arc::new(revision),
        }
    }

    /// Ticks once per visible change to the article list.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArticleStorage for MemoryStorage {
    async fn load_initial(&self, articles: Vec<Article>) -> Result<bool> {
        let loaded = self.store.write().await.load_initial(articles);
        if loaded {
            self.bump();
        }
        Ok(loaded)
    }

    async fn merge_new(&self, candidates: Vec<Article>) -> Result<Vec<Article>> {
        let accepted = self.store.write().await.merge_new(candidates);
        if !accepted.is_empty() {
            self.bump();
        }
        Ok(accepted)
    }

    async fn attach_image(&self, id: &str, image: String) -> Result<bool> {
        let changed = self.store.write().await.attach_image(id, image);
        if changed {
            self.bump();
        }
        Ok(changed)
    }

    async fn attach_images(&self, images: HashMap<String, String>) -> Result<usize> {
        let applied = {
            let mut store = self.store.write().await;
            images
                .into_iter()
                .filter(|(id, image)| store.attach_image(id, image.clone()))
                .count()
        };
        if applied > 0 {
            self.bump();
        }
        Ok(applied)
    }

    async fn append(&self, article: Article) -> Result<()> {
        self.store.write().await.append(article)?;
        self.bump();
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Article>> {
        Ok(self.store.read().await.articles().to_vec())
    }

    async fn get(&self, id: &str) -> Result<Option<Article>> {
        let store = self.store.read().await;
        Ok(store.articles().iter().find(|a| a.id == id).cloned())
    }

    async fn recent_titles(&self, limit: usize) -> Result<Vec<String>> {
        let store = self.store.read().await;
        Ok(store.articles().iter().take(limit).map(|a| a.title.clone()).collect())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.store.read().await.articles().len())
    }
}
