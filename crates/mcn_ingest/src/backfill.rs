use base64::Engine;
use futures::future::join_all;
use mcn_core::{Article, ArticleStorage, ImageOptions, InferenceModel, Notifier};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as TokioMutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::IngestConfig;
use crate::guard::RunGuard;
use crate::logging::Logger;
use crate::prompts;

pub const IMAGE_BUSY_MESSAGE: &str = "Image service is busy. Some images may not load.";

/// What one backfill pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillReport {
    /// Articles that needed a cover.
    pub candidates: usize,
    pub generated: usize,
    /// Covers that actually landed in the store.
    pub applied: usize,
    pub rate_limited: bool,
    /// Another pass was already running; nothing was attempted.
    pub skipped_busy: bool,
}

/// Generates cover images one article at a time for anything still without one.
#[derive(Clone)]
pub struct BackfillWorker {
    storage: Arc<dyn ArticleStorage>,
    model: Arc<dyn InferenceModel>,
    notifier: Notifier,
    guard: RunGuard,
    options: ImageOptions,
    item_delay: Duration,
    notice_ttl: Duration,
    alive: CancellationToken,
    tasks: Arc<TokioMutex<Vec<JoinHandle<BackfillReport>>>>,
    log: Logger,
}

impl BackfillWorker {
    pub fn new(
        storage: Arc<dyn ArticleStorage>,
        model: Arc<dyn InferenceModel>,
        notifier: Notifier,
        config: &IngestConfig,
        alive: CancellationToken,
    ) -> Self {
        Self {
            storage,
            model,
            notifier,
            guard: RunGuard::new(),
            options: ImageOptions::default(),
            item_delay: config.image_delay,
            notice_ttl: config.notice_ttl,
            alive,
            tasks: Arc::new(TokioMutex::new(Vec::new())),
            log: Logger::new().with_prefix("🖼️").with_prefix("[backfill]"),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }

    /// Run a pass in the background and keep its handle so shutdown can wait for it.
    pub async fn spawn(&self, articles: Vec<Article>) {
        let worker = self.clone();
        let handle = tokio::spawn(async move { worker.run(articles).await });

        let mut tasks = self.tasks.lock().await;
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }

    /// Wait for every spawned pass to end.
    pub async fn join_pending(&self) -> Vec<BackfillReport> {
        let handles: Vec<_> = self.tasks.lock().await.drain(..).collect();
        join_all(handles)
            .await
            .into_iter()
            .filter_map(|joined| match joined {
                Ok(report) => Some(report),
                Err(e) => {
                    self.log.error(&format!("Backfill task failed: {}", e));
                    None
                }
            })
            .collect()
    }

    pub async fn run(&self, articles: Vec<Article>) -> BackfillReport {
        let pending: Vec<Article> = articles.into_iter().filter(Article::needs_image).collect();
        let mut report = BackfillReport {
            candidates: pending.len(),
            ..BackfillReport::default()
        };
        if pending.is_empty() {
            return report;
        }

        let Some(permit) = self.guard.try_start() else {
            self.log.info("Image generation already in progress, skipping");
            report.skipped_busy = true;
            return report;
        };

        self.log.info(&format!("Starting image generation for {} articles", pending.len()));
        let mut generated: HashMap<String, String> = HashMap::new();

        for article in &pending {
            if self.alive.is_cancelled() {
                break;
            }

            let prompt = prompts::cover_image_prompt(article);
            match self.model.generate_images(&prompt, &self.options).await {
                Ok(images) => match images.into_iter().next() {
                    Some(image) => {
                        let encoded = base64::engine::general_purpose::STANDARD.encode(&image.bytes);
                        generated.insert(article.id.clone(), format!("data:{};base64,{}", image.mime_type, encoded));
                        self.log.debug(&format!("Generated cover for '{}'", article.title));
                    }
                    None => self.log.warn(&format!("No image returned for '{}'", article.title)),
                },
                Err(e) if e.is_rate_limited() => {
                    self.log.warn(&format!("Rate limit hit while generating '{}': {}. Stopping this pass", article.title, e));
                    report.rate_limited = true;
                    if !self.alive.is_cancelled() {
                        self.notifier.notify(IMAGE_BUSY_MESSAGE, self.notice_ttl);
                    }
                    break;
                }
                Err(e) => {
                    self.log.warn(&format!("Failed to generate image for '{}': {}", article.title, e));
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.item_delay) => {}
                _ = self.alive.cancelled() => break,
            }
        }

        report.generated = generated.len();
        if !generated.is_empty() {
            if self.alive.is_cancelled() {
                self.log.info("Shut down during generation, discarding covers");
            } else {
                match self.storage.attach_images(generated).await {
                    Ok(applied) => report.applied = applied,
                    Err(e) => self.log.error(&format!("Failed to attach generated images: {}", e)),
                }
            }
        }

        permit.finish();
        self.log.info(&format!(
            "✨ Image generation finished: {}/{} covers applied",
            report.applied, report.candidates
        ));
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use mcn_core::{Category, Error, GeneratedImage, GenerationOptions, Result};
    use mcn_storage::MemoryStorage;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Plays back one scripted result per image request.
    struct ScriptedImages {
        results: Mutex<VecDeque<Result<Vec<GeneratedImage>>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedImages {
        fn new(results: Vec<Result<Vec<GeneratedImage>>>) -> Arc<Self> {
            Arc::new(Self {
                results: Mutex::new(results.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl InferenceModel for ScriptedImages {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate_text(&self, _prompt: &str, _options: &GenerationOptions) -> Result<String> {
            Ok(String::new())
        }

        async fn generate_images(&self, prompt: &str, _options: &ImageOptions) -> Result<Vec<GeneratedImage>> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            tokio::task::yield_now().await;
            self.results.lock().unwrap().pop_front().unwrap_or_else(|| Ok(vec![jpeg()]))
        }
    }

    fn jpeg() -> GeneratedImage {
        GeneratedImage {
            bytes: vec![0xFF, 0xD8, 0xFF, 0xD9],
            mime_type: "image/jpeg".to_string(),
        }
    }

    fn article(id: &str, image: Option<&str>) -> Article {
        Article {
            id: id.to_string(),
            title: format!("Title {}", id),
            description: format!("Description {}", id),
            url: format!("https://example.com/{}", id),
            source: "test".to_string(),
            image: image.map(str::to_string),
            published: Utc::now(),
            fetched_at: Utc::now(),
            location: "Toronto".to_string(),
            category: Category::Local,
            author: None,
        }
    }

    async fn setup(
        articles: Vec<Article>,
        results: Vec<Result<Vec<GeneratedImage>>>,
    ) -> (BackfillWorker, Arc<MemoryStorage>, Arc<ScriptedImages>, Notifier) {
        let storage = Arc::new(MemoryStorage::new());
        storage.load_initial(articles).await.unwrap();
        let model = ScriptedImages::new(results);
        let notifier = Notifier::new();
        let worker = BackfillWorker::new(
            storage.clone(),
            model.clone(),
            notifier.clone(),
            &IngestConfig::default(),
            CancellationToken::new(),
        );
        (worker, storage, model, notifier)
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_stops_the_pass() {
        let seed = vec![article("1", None), article("2", None), article("3", None)];
        let (worker, storage, model, notifier) = setup(
            seed.clone(),
            vec![
                Ok(vec![jpeg()]),
                Err(Error::Api {
                    status: 429,
                    message: "RESOURCE_EXHAUSTED".to_string(),
                }),
            ],
        )
        .await;

        let report = worker.run(seed).await;

        assert!(report.rate_limited);
        assert_eq!(report.applied, 1);
        assert_eq!(model.calls(), 2);
        assert!(!worker.is_busy());

        let one = storage.get("1").await.unwrap().unwrap();
        assert_eq!(one.image.as_deref(), Some("data:image/jpeg;base64,/9j/2Q=="));
        assert!(storage.get("2").await.unwrap().unwrap().image.is_none());
        assert!(storage.get("3").await.unwrap().unwrap().image.is_none());
        assert_eq!(notifier.current().unwrap().message, IMAGE_BUSY_MESSAGE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_errors_are_skipped() {
        let seed = vec![article("1", None), article("2", None), article("3", None)];
        let (worker, storage, model, notifier) = setup(
            seed.clone(),
            vec![
                Ok(vec![jpeg()]),
                Err(Error::Inference("content filtered".to_string())),
                Ok(vec![jpeg()]),
            ],
        )
        .await;

        let report = worker.run(seed).await;

        assert!(!report.rate_limited);
        assert_eq!(report.applied, 2);
        assert_eq!(model.calls(), 3);
        assert!(storage.get("2").await.unwrap().unwrap().image.is_none());
        assert!(storage.get("3").await.unwrap().unwrap().image.is_some());
        assert!(notifier.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_articles_without_real_images_are_processed() {
        let seed = vec![
            article("stock", Some("https://picsum.photos/seed/a/800/450")),
            article("done", Some("data:image/png;base64,AAAA")),
        ];
        let (worker, storage, model, _) = setup(seed.clone(), vec![]).await;

        let report = worker.run(seed).await;

        assert_eq!(report.candidates, 1);
        assert_eq!(model.calls(), 1);
        let stock = storage.get("stock").await.unwrap().unwrap();
        assert!(stock.image.unwrap().starts_with("data:image/jpeg;base64,"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_are_spaced_out() {
        let seed = vec![article("1", None), article("2", None)];
        let (worker, _, _, _) = setup(seed.clone(), vec![]).await;

        let started = tokio::time::Instant::now();
        worker.run(seed).await;
        assert!(started.elapsed() >= Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_pass_while_running_is_a_no_op() {
        let seed = vec![article("1", None), article("2", None)];
        let (worker, _, model, _) = setup(seed.clone(), vec![]).await;

        let first = {
            let worker = worker.clone();
            let seed = seed.clone();
            tokio::spawn(async move { worker.run(seed).await })
        };
        tokio::task::yield_now().await;
        while !worker.is_busy() {
            tokio::task::yield_now().await;
        }

        let second = worker.run(seed).await;
        assert!(second.skipped_busy);

        let first = first.await.unwrap();
        assert_eq!(first.applied, 2);
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_passes_can_be_awaited() {
        let seed = vec![article("1", None)];
        let (worker, storage, _, _) = setup(seed.clone(), vec![]).await;

        worker.spawn(seed).await;
        let reports = worker.join_pending().await;

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].applied, 1);
        assert!(storage.get("1").await.unwrap().unwrap().image.is_some());
        assert!(worker.join_pending().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_discards_late_results() {
        let seed = vec![article("1", None), article("2", None)];
        let storage = Arc::new(MemoryStorage::new());
        storage.load_initial(seed.clone()).await.unwrap();
        let alive = CancellationToken::new();
        let worker = BackfillWorker::new(
            storage.clone(),
            ScriptedImages::new(vec![]),
            Notifier::new(),
            &IngestConfig::default(),
            alive.clone(),
        );

        let pass = tokio::spawn({
            let worker = worker.clone();
            async move { worker.run(seed).await }
        });
        tokio::time::sleep(Duration::from_millis(500)).await;
        alive.cancel();

        let report = pass.await.unwrap();
        assert_eq!(report.generated, 1);
        assert_eq!(report.applied, 0);
        assert!(storage.get("1").await.unwrap().unwrap().image.is_none());
        assert!(!worker.is_busy());
    }
}
