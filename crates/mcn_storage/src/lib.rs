pub mod memory;
pub mod query;

pub use memory::{MemoryStorage, MemoryStore};

pub mod prelude {
    pub use super::memory::MemoryStorage;
    pub use super::query;
    pub use mcn_core::{Article, ArticleStorage, Category, Result};
}
