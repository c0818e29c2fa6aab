use mcn_core::{Article, ArticleStorage, Category, Error, GenerationOptions, InferenceModel, Notifier};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::backfill::BackfillWorker;
use crate::candidate::{accept_batch, CandidateContext};
use crate::config::IngestConfig;
use crate::extract::{parse_candidate_batch, CandidateBatch};
use crate::guard::RunGuard;
use crate::logging::Logger;
use crate::prompts;

/// Where a refresh cycle currently is. Failures go straight back to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    Idle,
    Fetching,
    Parsing,
    Validating,
    Merging,
}

/// How one refresh cycle ended.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// A cycle was already in flight; nothing was requested.
    Busy,
    Added(Vec<Article>),
    /// Nothing passed the quality gate or everything was already stored.
    UpToDate,
    /// The answer had no fenced JSON block.
    InvalidFormat,
    ParseFailed(String),
    /// Valid JSON that is not an array.
    Malformed,
    ServiceBusy,
    NetworkError(String),
    /// The feed was shut down while the request was in flight.
    Abandoned,
}

impl IngestOutcome {
    /// What the reader is told, if anything.
    pub fn message(&self) -> Option<String> {
        let message = match self {
            IngestOutcome::Busy => "Already checking for the latest news...".to_string(),
            IngestOutcome::Added(added) => format!("Successfully added {} new stories.", added.len()),
            IngestOutcome::UpToDate => "Checked for new stories, but you're already up to date.".to_string(),
            IngestOutcome::InvalidFormat => "Received an invalid format from the news service.".to_string(),
            IngestOutcome::ParseFailed(_) => "Failed to process news data.".to_string(),
            IngestOutcome::Malformed => "Received malformed news data from the news service.".to_string(),
            IngestOutcome::ServiceBusy => "News service is currently busy. Please try again later.".to_string(),
            IngestOutcome::NetworkError(_) => "A network error occurred while fetching news.".to_string(),
            IngestOutcome::Abandoned => return None,
        };
        Some(message)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            IngestOutcome::Busy => "busy",
            IngestOutcome::Added(_) => "added",
            IngestOutcome::UpToDate => "up_to_date",
            IngestOutcome::InvalidFormat => "invalid_format",
            IngestOutcome::ParseFailed(_) => "parse_failed",
            IngestOutcome::Malformed => "malformed",
            IngestOutcome::ServiceBusy => "service_busy",
            IngestOutcome::NetworkError(_) => "network_error",
            IngestOutcome::Abandoned => "abandoned",
        }
    }

    pub fn added(&self) -> &[Article] {
        match self {
            IngestOutcome::Added(added) => added,
            _ => &[],
        }
    }
}

/// Asks the text model for fresh stories and merges the good, new ones into the store.
#[derive(Clone)]
pub struct IngestionPipeline {
    storage: Arc<dyn ArticleStorage>,
    model: Arc<dyn InferenceModel>,
    notifier: Notifier,
    backfill: BackfillWorker,
    config: Arc<IngestConfig>,
    guard: RunGuard,
    state: Arc<watch::Sender<PipelineState>>,
    alive: CancellationToken,
    log: Logger,
}

impl IngestionPipeline {
    pub fn new(
        storage: Arc<dyn ArticleStorage>,
        model: Arc<dyn InferenceModel>,
        notifier: Notifier,
        backfill: BackfillWorker,
        config: Arc<IngestConfig>,
        alive: CancellationToken,
    ) -> Self {
        let (state, _) = watch::channel(PipelineState::Idle);
        Self {
            storage,
            model,
            notifier,
            backfill,
            config,
            guard: RunGuard::new(),
            state: Arc::new(state),
            alive,
            log: Logger::new().with_prefix("📰").with_prefix("[pipeline]"),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }

    pub fn state(&self) -> PipelineState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<PipelineState> {
        self.state.subscribe()
    }

    /// Run one refresh cycle. Never errors: every failure ends as an outcome and a notice.
    pub async fn run_cycle(&self) -> IngestOutcome {
        let Some(permit) = self.guard.try_start() else {
            self.log.info("Refresh already in progress, ignoring trigger");
            self.announce(&IngestOutcome::Busy);
            return IngestOutcome::Busy;
        };

        let outcome = self.cycle().await;
        self.set_state(PipelineState::Idle);
        permit.finish();

        self.announce(&outcome);
        if let IngestOutcome::Added(added) = &outcome {
            self.backfill.spawn(added.clone()).await;
        }
        outcome
    }

    async fn cycle(&self) -> IngestOutcome {
        self.set_state(PipelineState::Fetching);
        let recent_titles = match self.storage.recent_titles(self.config.recent_title_limit).await {
            Ok(titles) => titles,
            Err(e) => {
                self.log.warn(&format!("Could not read recent titles, sending no hint: {}", e));
                Vec::new()
            }
        };
        let prompt = prompts::news_prompt(
            &self.config.region,
            self.config.story_count,
            &recent_titles,
            &Category::requestable(),
        );

        self.log.info(&format!("Requesting {} stories from {}", self.config.story_count, self.model.name()));
        let options = GenerationOptions { search_grounding: true };
        let raw = match self.model.generate_text(&prompt, &options).await {
            Ok(raw) => raw,
            Err(e) => return self.classify_failure(e),
        };
        if self.alive.is_cancelled() {
            return IngestOutcome::Abandoned;
        }

        self.set_state(PipelineState::Parsing);
        let candidates = match parse_candidate_batch(&raw) {
            CandidateBatch::Items(items) => items,
            CandidateBatch::NoBlock => {
                self.log.warn("No JSON block found in the model answer");
                return IngestOutcome::InvalidFormat;
            }
            CandidateBatch::ParseError(e) => {
                self.log.warn(&format!("Failed to parse JSON from the model answer: {}", e));
                return IngestOutcome::ParseFailed(e);
            }
            CandidateBatch::NotAnArray => {
                self.log.warn("Parsed data is not an array");
                return IngestOutcome::Malformed;
            }
        };

        self.set_state(PipelineState::Validating);
        let received = candidates.len();
        let ctx = CandidateContext::new(&self.config.region, &self.config.ai_author);
        let accepted = accept_batch(candidates, &ctx);
        self.log.debug(&format!("{}/{} candidates passed the quality gate", accepted.len(), received));
        if accepted.is_empty() {
            return IngestOutcome::UpToDate;
        }

        self.set_state(PipelineState::Merging);
        match self.storage.merge_new(accepted).await {
            Ok(added) if added.is_empty() => IngestOutcome::UpToDate,
            Ok(added) => {
                self.log.info(&format!("✨ Added {} new stories", added.len()));
                IngestOutcome::Added(added)
            }
            Err(e) => {
                self.log.error(&format!("Failed to merge new stories: {}", e));
                IngestOutcome::NetworkError(e.to_string())
            }
        }
    }

    fn classify_failure(&self, error: Error) -> IngestOutcome {
        if self.alive.is_cancelled() {
            return IngestOutcome::Abandoned;
        }
        if error.is_rate_limited() {
            self.log.warn(&format!("News service rate limited: {}", error));
            IngestOutcome::ServiceBusy
        } else {
            self.log.error(&format!("Failed to fetch news: {}", error));
            IngestOutcome::NetworkError(error.to_string())
        }
    }

    fn announce(&self, outcome: &IngestOutcome) {
        if self.alive.is_cancelled() {
            return;
        }
        let Some(message) = outcome.message() else {
            return;
        };
        let ttl = match outcome {
            IngestOutcome::Busy => self.config.busy_notice_ttl,
            _ => self.config.notice_ttl,
        };
        self.notifier.notify(message, ttl);
    }

    fn set_state(&self, state: PipelineState) {
        self.state.send_replace(state);
    }
}
