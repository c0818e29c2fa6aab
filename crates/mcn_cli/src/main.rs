use anyhow::Context;
use clap::Parser;
use mcn_core::InferenceModel;
use mcn_inference::models::DummyModel;
use mcn_ingest::{init_logging, FeedArgs, FeedCommands, FeedManager, IngestConfig, SeedSource};
use mcn_storage::MemoryStorage;
use mcn_web::{create_app, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

mod duration;

use duration::HumanDuration;

#[derive(Parser, Debug)]
#[command(author, version, about = "MyCityNews feed service", long_about = None)]
pub struct Cli {
    #[arg(long, env = "MCN_MODEL", default_value = "gemini", help = "Model to use for inference. Available models: gemini (default), dummy")]
    model: String,
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, env = "MCN_MODEL_URL", help = "Override the generative service base URL")]
    model_url: Option<String>,
    #[arg(long, env = "MCN_SEED", default_value = "articles.json", help = "Seed bundle path or http(s) URL")]
    seed: String,
    #[arg(long, env = "MCN_LOCATION", help = "Reader location (default Toronto)")]
    location: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the feed with scheduled refreshes and serve the JSON API
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: SocketAddr,
        /// Time between refreshes (e.g. 10m, 1h, 1h15m)
        #[arg(long, default_value = "10m")]
        interval: HumanDuration,
        /// Wait before the first refresh
        #[arg(long, default_value = "20s")]
        initial_delay: HumanDuration,
    },
    #[command(flatten)]
    Feed(FeedCommands),
}

fn build_model(cli: &Cli) -> anyhow::Result<Arc<dyn InferenceModel>> {
    let mut config = mcn_inference::Config::default();
    if let Some(api_key) = cli.api_key.clone().or_else(|| std::env::var("API_KEY").ok()) {
        config = config.with_api_key(api_key);
    }
    if let Some(url) = &cli.model_url {
        config = config.with_base_url(url.clone());
    }
    let model = mcn_inference::create_model(&cli.model, config)
        .with_context(|| format!("Failed to initialize model '{}'", cli.model))?;
    info!("🧠 Inference model initialized successfully (using {})", model.name());
    Ok(model)
}

async fn serve(manager: Arc<FeedManager>, seed: &SeedSource, addr: SocketAddr) -> anyhow::Result<()> {
    manager.start(seed).await;

    let app = create_app(AppState::new(manager.clone()));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("🌐 Serving the feed API on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
            }
        })
        .await
        .context("HTTP server failed")?;

    manager.shutdown().await;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging();
    let cli = Cli::parse();

    let seed: SeedSource = cli.seed.parse().context("Invalid seed location")?;
    let mut config = IngestConfig::from_env();
    if let Some(location) = &cli.location {
        config = config.with_user_location(location.clone());
    }

    // Listing categories needs no credentials.
    let model: Arc<dyn InferenceModel> = match &cli.command {
        Commands::Feed(FeedCommands::Categories) => Arc::new(DummyModel::new()),
        _ => build_model(&cli)?,
    };
    let storage = Arc::new(MemoryStorage::new());

    match cli.command {
        Commands::Serve {
            addr,
            interval,
            initial_delay,
        } => {
            let config = config.with_schedule(initial_delay.0, interval.0);
            let manager = Arc::new(FeedManager::new(storage, model, config));
            serve(manager, &seed, addr).await?;
        }
        Commands::Feed(command) => {
            let manager = FeedManager::new(storage, model, config);
            mcn_ingest::handle_command(FeedArgs { command }, &manager, &seed).await?;
        }
    }

    Ok(())
}
