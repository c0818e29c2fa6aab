use mcn_core::{Article, ArticleStorage, InferenceModel, Notification, Notifier, Result, StorySubmission};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex as TokioMutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::backfill::{BackfillReport, BackfillWorker};
use crate::config::IngestConfig;
use crate::pipeline::{IngestOutcome, IngestionPipeline, PipelineState};
use crate::scheduler::Schedule;
use crate::seed::{SeedLoader, SeedSource, SEED_LOAD_ERROR};
use crate::submit::{self, SUBMITTED_MESSAGE};

/// Owns the feed's moving parts: seed load, scheduled refreshes, image backfill,
/// reader submissions and the notification slot.
pub struct FeedManager {
    storage: Arc<dyn ArticleStorage>,
    notifier: Notifier,
    pipeline: IngestionPipeline,
    backfill: BackfillWorker,
    config: Arc<IngestConfig>,
    seed_loader: SeedLoader,
    location: RwLock<String>,
    load_error: RwLock<Option<String>>,
    alive: CancellationToken,
    schedule: TokioMutex<Option<Schedule>>,
}

impl FeedManager {
    pub fn new(storage: Arc<dyn ArticleStorage>, model: Arc<dyn InferenceModel>, config: IngestConfig) -> Self {
        let config = Arc::new(config);
        let notifier = Notifier::new();
        let alive = CancellationToken::new();
        let backfill = BackfillWorker::new(storage.clone(), model.clone(), notifier.clone(), &config, alive.clone());
        let pipeline = IngestionPipeline::new(
            storage.clone(),
            model,
            notifier.clone(),
            backfill.clone(),
            config.clone(),
            alive.clone(),
        );

        Self {
            location: RwLock::new(config.user_location.clone()),
            storage,
            notifier,
            pipeline,
            backfill,
            config,
            seed_loader: SeedLoader::new(),
            load_error: RwLock::new(None),
            alive,
            schedule: TokioMutex::new(None),
        }
    }

    pub fn with_seed_loader(mut self, loader: SeedLoader) -> Self {
        self.seed_loader = loader;
        self
    }

    /// Load the seed bundle, backfill its covers in the background, then begin
    /// the refresh schedule.
    pub async fn start(&self, source: &SeedSource) {
        match self.load_seed(source).await {
            Ok(0) => {}
            Ok(_) => {
                if let Err(e) = self.backfill_store().await {
                    error!("Failed to read the store for image backfill: {}", e);
                }
            }
            Err(e) => error!("Failed to load seed from {}: {}", source, e),
        }
        self.start_schedule().await;
    }

    /// Fill the empty store from the bundle. No images are requested.
    /// Failures are kept as the reader-facing load error.
    pub async fn load_seed(&self, source: &SeedSource) -> Result<usize> {
        let articles = match self.seed_loader.load(source).await {
            Ok(articles) => articles,
            Err(e) => {
                self.set_load_error(Some(SEED_LOAD_ERROR.to_string()));
                return Err(e);
            }
        };

        if !self.storage.load_initial(articles).await? {
            info!("Store already populated, ignoring seed bundle");
            return Ok(0);
        }
        self.set_load_error(None);

        let seeded = self.storage.len().await?;
        info!("📦 Store seeded with {} articles", seeded);
        Ok(seeded)
    }

    /// Queue a background cover pass over everything in the store.
    pub async fn backfill_store(&self) -> Result<()> {
        let articles = self.storage.all().await?;
        self.backfill.spawn(articles).await;
        Ok(())
    }

    /// Wait for every queued cover pass to finish on its own.
    pub async fn wait_for_backfill(&self) -> Vec<BackfillReport> {
        self.backfill.join_pending().await
    }

    pub async fn start_schedule(&self) {
        let mut slot = self.schedule.lock().await;
        if slot.is_some() || self.alive.is_cancelled() {
            return;
        }

        let pipeline = self.pipeline.clone();
        info!(
            "⏰ Refreshing in {:?}, then every {:?}",
            self.config.initial_delay, self.config.refresh_interval
        );
        *slot = Some(Schedule::spawn(
            self.config.initial_delay,
            self.config.refresh_interval,
            &self.alive,
            move || {
                let pipeline = pipeline.clone();
                async move {
                    pipeline.run_cycle().await;
                }
            },
        ));
    }

    /// Manual trigger. Refused with a busy notice while a cycle is running.
    pub async fn refresh(&self) -> IngestOutcome {
        self.pipeline.run_cycle().await
    }

    pub async fn submit(&self, submission: StorySubmission) -> Result<Article> {
        let article = submit::build_article(submission, &self.location())?;
        self.storage.append(article.clone()).await?;
        info!("📝 Story submitted: {}", article.title);

        self.notifier.notify(SUBMITTED_MESSAGE, self.config.notice_ttl);
        self.backfill.spawn(vec![article.clone()]).await;
        Ok(article)
    }

    /// Stop timers, drop late results and wait for background image work to end.
    pub async fn shutdown(&self) {
        self.alive.cancel();
        if let Some(schedule) = self.schedule.lock().await.take() {
            schedule.shutdown().await;
        }
        self.notifier.shutdown();
        self.backfill.join_pending().await;
        info!("👋 Feed shut down");
    }

    pub fn storage(&self) -> Arc<dyn ArticleStorage> {
        self.storage.clone()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn notification(&self) -> Option<Notification> {
        self.notifier.current()
    }

    pub fn is_refreshing(&self) -> bool {
        self.pipeline.is_busy()
    }

    pub fn is_backfilling(&self) -> bool {
        self.backfill.is_busy()
    }

    pub fn pipeline_state(&self) -> PipelineState {
        self.pipeline.state()
    }

    pub fn is_running(&self) -> bool {
        !self.alive.is_cancelled()
    }

    pub fn load_error(&self) -> Option<String> {
        self.load_error.read().map(|e| e.clone()).unwrap_or_else(|p| p.into_inner().clone())
    }

    pub fn location(&self) -> String {
        self.location.read().map(|l| l.clone()).unwrap_or_else(|p| p.into_inner().clone())
    }

    pub fn set_location(&self, location: impl Into<String>) {
        let location = location.into();
        match self.location.write() {
            Ok(mut current) => *current = location,
            Err(poisoned) => *poisoned.into_inner() = location,
        }
    }

    fn set_load_error(&self, message: Option<String>) {
        match self.load_error.write() {
            Ok(mut current) => *current = message,
            Err(poisoned) => *poisoned.into_inner() = message,
        }
    }
}
