use clap::{Args, Subcommand};
use mcn_core::{Article, Category, Result, StorySubmission};
use mcn_storage::query;

use crate::manager::FeedManager;
use crate::pipeline::IngestOutcome;
use crate::seed::SeedSource;

#[derive(Args, Debug)]
pub struct FeedArgs {
    #[command(subcommand)]
    pub command: FeedCommands,
}

#[derive(Subcommand, Debug)]
pub enum FeedCommands {
    /// Load the seed bundle and run one refresh cycle
    Refresh,
    /// Print the articles in the feed
    List {
        /// Only articles in this category
        #[arg(long)]
        category: Option<String>,
        /// Case-insensitive search over title and description
        #[arg(long)]
        query: Option<String>,
        /// Feed location (Canada and World show everything)
        #[arg(long)]
        location: Option<String>,
    },
    /// Submit a community story
    Submit {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        author: Option<String>,
        #[arg(long, default_value = "local")]
        category: Category,
    },
    /// Print the category vocabulary
    Categories,
}

pub async fn handle_command(args: FeedArgs, manager: &FeedManager, seed: &SeedSource) -> Result<()> {
    match args.command {
        FeedCommands::Categories => {
            for category in Category::ALL {
                let mut flags = Vec::new();
                if category.is_requestable() {
                    flags.push("ai");
                }
                if category.is_user_selectable() {
                    flags.push("submit");
                }
                println!("{:<14} {}", category.as_str(), flags.join(", "));
            }
            return Ok(());
        }
        FeedCommands::Refresh => {
            load_seed(manager, seed).await;
            let outcome = manager.refresh().await;
            report_outcome(&outcome);
            report_covers(manager).await;
        }
        FeedCommands::List {
            category,
            query: search,
            location,
        } => {
            load_seed(manager, seed).await;
            let articles = manager.storage().all().await?;
            let location = location.unwrap_or_else(|| manager.location());
            let mut selected = query::for_location(&articles, &location);
            if let Some(category) = category {
                selected = query::by_category(&selected, &category);
            }
            if let Some(search) = search {
                selected = query::search(&selected, &search);
            }
            println!("Found {} articles", selected.len());
            for article in &selected {
                print_article(article);
            }
        }
        FeedCommands::Submit {
            title,
            description,
            author,
            category,
        } => {
            load_seed(manager, seed).await;
            let article = manager
                .submit(StorySubmission {
                    title,
                    description,
                    author,
                    category,
                })
                .await?;
            println!("🆕 {} ({})", article.title, article.id);
            report_covers(manager).await;
        }
    }

    manager.shutdown().await;
    Ok(())
}

async fn load_seed(manager: &FeedManager, seed: &SeedSource) {
    if manager.load_seed(seed).await.is_err() {
        if let Some(message) = manager.load_error() {
            eprintln!("⚠️ {}", message);
        }
    }
}

/// Let queued cover passes finish before the process exits.
async fn report_covers(manager: &FeedManager) {
    let applied: usize = manager.wait_for_backfill().await.iter().map(|r| r.applied).sum();
    if applied > 0 {
        println!("🖼️ Generated {} cover images", applied);
    }
}

fn report_outcome(outcome: &IngestOutcome) {
    if let Some(message) = outcome.message() {
        println!("{}", message);
    }
    for article in outcome.added() {
        print_article(article);
    }
}

fn print_article(article: &Article) {
    let emoji = if article.needs_image() { "📰" } else { "🖼️" };
    println!(
        "{} [{}] {} - {} ({})",
        emoji, article.category, article.title, article.source, article.url
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IngestConfig;
    use async_trait::async_trait;
    use mcn_core::{ArticleStorage, GeneratedImage, GenerationOptions, ImageOptions, InferenceModel};
    use mcn_storage::MemoryStorage;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct CountingModel {
        answer: String,
        image_calls: AtomicUsize,
    }

    #[async_trait]
    impl InferenceModel for CountingModel {
        fn name(&self) -> &str {
            "counting"
        }

        async fn generate_text(&self, _prompt: &str, _options: &GenerationOptions) -> Result<String> {
            Ok(self.answer.clone())
        }

        async fn generate_images(&self, _prompt: &str, _options: &ImageOptions) -> Result<Vec<GeneratedImage>> {
            self.image_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![GeneratedImage {
                bytes: vec![0xff, 0xd8],
                mime_type: "image/jpeg".to_string(),
            }])
        }
    }

    fn seed_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"{"articles": [{"id": "a", "title": "A", "description": "First", "url": "https://news.example/a",
                "source": "Star", "image": null, "published": "2024-05-01T12:00:00Z", "location": "Toronto", "category": "local"}]}"#,
        )
        .unwrap();
        file
    }

    fn setup() -> (FeedManager, Arc<CountingModel>, Arc<MemoryStorage>) {
        let model = Arc::new(CountingModel {
            answer: "```json\n[{\"title\": \"Fresh\", \"description\": \"Just in.\", \"url\": \"https://news.example/fresh\", \"source\": \"CBC\", \"category\": \"world\"}]\n```".to_string(),
            image_calls: AtomicUsize::new(0),
        });
        let storage = Arc::new(MemoryStorage::new());
        let config = IngestConfig::default().with_image_delay(Duration::ZERO);
        (FeedManager::new(storage.clone(), model.clone(), config), model, storage)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_list_requests_no_images() {
        let (manager, model, storage) = setup();
        let file = seed_file();
        let command = FeedCommands::List {
            category: None,
            query: None,
            location: None,
        };

        handle_command(FeedArgs { command }, &manager, &SeedSource::File(file.path().to_path_buf()))
            .await
            .unwrap();

        assert_eq!(storage.len().await.unwrap(), 1);
        assert_eq!(model.image_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_refresh_waits_for_covers_of_added_stories() {
        let (manager, model, storage) = setup();
        let file = seed_file();

        handle_command(
            FeedArgs {
                command: FeedCommands::Refresh,
            },
            &manager,
            &SeedSource::File(file.path().to_path_buf()),
        )
        .await
        .unwrap();

        let all = storage.all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].title, "Fresh");
        assert_eq!(all[0].image.as_deref(), Some("data:image/jpeg;base64,/9g="));
        assert!(all[1].image.is_none());
        assert_eq!(model.image_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_submit_waits_for_its_cover() {
        let (manager, model, storage) = setup();
        let file = seed_file();
        let command = FeedCommands::Submit {
            title: "Bake sale".to_string(),
            description: "Saturday at the school.".to_string(),
            author: None,
            category: Category::Local,
        };

        handle_command(FeedArgs { command }, &manager, &SeedSource::File(file.path().to_path_buf()))
            .await
            .unwrap();

        let all = storage.all().await.unwrap();
        assert_eq!(all[0].title, "Bake sale");
        assert!(all[0].image.is_some());
        assert_eq!(model.image_calls.load(Ordering::SeqCst), 1);
        assert!(!manager.is_running());
    }
}
