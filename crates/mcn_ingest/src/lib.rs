pub mod backfill;
pub mod candidate;
pub mod cli;
pub mod config;
pub mod extract;
pub mod guard;
pub mod logging;
pub mod manager;
pub mod pipeline;
pub mod prompts;
pub mod scheduler;
pub mod seed;
pub mod submit;

pub use backfill::{BackfillReport, BackfillWorker};
pub use cli::{handle_command, FeedArgs, FeedCommands};
pub use config::IngestConfig;
pub use guard::{RunGuard, RunPermit};
pub use logging::{init_logging, Logger};
pub use manager::FeedManager;
pub use pipeline::{IngestOutcome, IngestionPipeline, PipelineState};
pub use seed::{SeedLoader, SeedSource};

pub mod prelude {
    pub use super::{FeedManager, IngestConfig, IngestOutcome, SeedSource};
    pub use mcn_core::{Article, Category, Error, Result};
}
