use async_trait::async_trait;
use std::collections::HashMap;
use crate::types::Article;
use crate::Result;

#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// Replace the contents with the seed set, only if the store is empty.
    /// Returns whether the articles were taken.
    async fn load_initial(&self, articles: Vec<Article>) -> Result<bool>;

    /// Prepend every candidate whose url is not already stored.
    /// Returns the accepted subset in the order it was prepended.
    async fn merge_new(&self, candidates: Vec<Article>) -> Result<Vec<Article>>;

    /// Attach a generated image to one article. Returns false if nothing changed.
    async fn attach_image(&self, id: &str, image: String) -> Result<bool>;

    /// Apply a batch of id -> image updates as a single change. Returns how many landed.
    async fn attach_images(&self, images: HashMap<String, String>) -> Result<usize>;

    /// Put a reader-submitted article at the front.
    async fn append(&self, article: Article) -> Result<()>;

    /// Snapshot of every article, front first.
    async fn all(&self) -> Result<Vec<Article>>;

    async fn get(&self, id: &str) -> Result<Option<Article>>;

    /// Titles of the first `limit` articles.
    async fn recent_titles(&self, limit: usize) -> Result<Vec<String>>;

    async fn len(&self) -> Result<usize>;
}
