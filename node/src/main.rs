// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use clap::Parser;
use ledger_effects::config::{PageLimits, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use ledger_effects_node::config::NodeConfig;
use ledger_effects_node::errors::NodeError;
use ledger_effects_node::history::MemoryHistory;
use ledger_effects_node::server::{build_router, AppState};
use ledger_effects_node::telemetry::init_telemetry;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(name = "ledger-effects-node", about = "Serves ledger effects as pages and event streams")]
struct Args {
    #[arg(long, env = "EFFECTS_BIND_ADDR", default_value = "127.0.0.1:8000")]
    bind_addr: SocketAddr,

    #[arg(long, env = "EFFECTS_DEFAULT_LIMIT", default_value_t = DEFAULT_PAGE_LIMIT)]
    default_limit: u64,

    #[arg(long, env = "EFFECTS_MAX_LIMIT", default_value_t = MAX_PAGE_LIMIT)]
    max_limit: u64,

    /// Seconds between stream polls when no ledger arrives.
    #[arg(long, env = "EFFECTS_STREAM_POLL_SECS", default_value_t = 1)]
    stream_poll_secs: u64,

    #[arg(long, env = "EFFECTS_STREAM_RETRY_MS", default_value_t = 1000)]
    stream_retry_ms: u64,

    #[arg(long, env = "EFFECTS_ALLOW_UNSCOPED", default_value_t = true, action = clap::ArgAction::Set)]
    allow_unscoped: bool,

    #[arg(long, env = "EFFECTS_SEED_PATH")]
    seed_path: Option<PathBuf>,

    /// Number of most recent ledgers to keep.
    #[arg(long, env = "EFFECTS_HISTORY_RETENTION")]
    history_retention: Option<u32>,

    #[arg(long, env = "EFFECTS_REAP_SECS", default_value_t = 60)]
    reap_secs: u64,
}

impl Args {
    fn into_config(self) -> Result<NodeConfig, NodeError> {
        if self.default_limit == 0 || self.default_limit > self.max_limit {
            return Err(NodeError::InvalidInput(format!(
                "default limit {} must be between 1 and max limit {}",
                self.default_limit, self.max_limit
            )));
        }
        Ok(NodeConfig {
            bind_addr: self.bind_addr,
            page_limits: PageLimits {
                default: self.default_limit,
                max: self.max_limit,
            },
            stream_poll_interval: Duration::from_secs(self.stream_poll_secs.max(1)),
            stream_retry: Duration::from_millis(self.stream_retry_ms),
            allow_unscoped: self.allow_unscoped,
            seed_path: self.seed_path,
            history_retention: self.history_retention,
            reap_interval: Duration::from_secs(self.reap_secs.max(1)),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), NodeError> {
    init_telemetry();

    let cfg = Args::parse().into_config()?;
    tracing::info!("Initializing effects node with config: {:?}", cfg);

    let history = match &cfg.seed_path {
        Some(path) => {
            tracing::info!("Loading history seed from {:?}", path);
            let history = MemoryHistory::load_seed_file(path)?;
            tracing::info!(
                "Seed loaded: {} effects, ledgers {:?}..{:?}",
                history.effect_count(),
                history.oldest_ledger(),
                history.latest_ledger()
            );
            history
        }
        None => MemoryHistory::new(),
    };
    let history = Arc::new(history);

    let state = AppState::new(history.clone(), cfg.clone());
    let shutdown = state.shutdown.clone();

    if let Some(retain) = cfg.history_retention {
        tokio::spawn(reap_history(history, retain, cfg.reap_interval, shutdown.clone()));
    }

    let app = build_router(state);

    let addr = cfg.bind_addr;
    tracing::info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutting down; closing open streams");
            shutdown.cancel();
        })
        .await?;
    Ok(())
}

async fn reap_history(history: Arc<MemoryHistory>, retain: u32, every: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(every);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = interval.tick() => {}
        }
        if let Err(e) = history.reap(retain) {
            tracing::error!("History reap failed: {}", e);
        }
    }
}
