//! Scoring committee HTTP server entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use committee::cache::{CacheSweeper, ResultCacheHandle};
use committee::config::Config;
use committee::gateway::{HandlerState, create_router_with_state};
use committee::pipeline::ScoringEngine;
use committee::rubric::{CachedRubricSource, FileRubricSource, RubricSource, StaticRubricSource};
use committee::scorer::{HttpScorer, PricingTable, ScorerRegistry};
use committee::telemetry::PerformanceRecorder;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check().await);
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        backends = config.backends.len(),
        "Scoring committee starting"
    );

    let pricing = match &config.pricing_path {
        Some(path) => Arc::new(PricingTable::from_path(path)?),
        None => {
            tracing::warn!("No COMMITTEE_PRICING_PATH configured, judgment costs will be 0");
            Arc::new(PricingTable::new())
        }
    };

    let mut registry = ScorerRegistry::new();
    for backend in &config.backends {
        let scorer = HttpScorer::new(&backend.name, &backend.base_url)
            .api_key(backend.api_key.clone())
            .max_output_tokens(config.max_output_tokens)
            .pricing(Arc::clone(&pricing));
        registry.register(&backend.name, Arc::new(scorer));
        tracing::info!(
            provider = %backend.name,
            base_url = %backend.base_url,
            authenticated = backend.api_key.is_some(),
            "registered scoring backend"
        );
    }

    let cache = ResultCacheHandle::with_capacity(config.cache_capacity);
    let sweeper = CacheSweeper::new(cache.clone(), config.cache_sweep_interval);
    let sweep_task = sweeper.start();

    let recorder = Arc::new(PerformanceRecorder::with_capacity(config.recorder_capacity));
    let engine = ScoringEngine::new(registry, cache.clone(), recorder)
        .with_thresholds(config.qc_thresholds)
        .with_scorer_timeout(config.scorer_timeout);

    let rubrics: Arc<dyn RubricSource> = match &config.rubrics_path {
        Some(path) => Arc::new(CachedRubricSource::new(
            FileRubricSource::load(path).await?,
            cache.clone(),
        )),
        None => {
            tracing::warn!("No COMMITTEE_RUBRICS_PATH configured, requests must carry a rubric");
            Arc::new(StaticRubricSource::default())
        }
    };

    let state = HandlerState::new(Arc::new(engine), rubrics);
    let app = create_router_with_state(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.stop();
    sweep_task.abort();
    tracing::info!(cached_entries = cache.len(), "Scoring committee shutdown complete");
    Ok(())
}

async fn run_health_check() -> i32 {
    let port = std::env::var("COMMITTEE_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);

    if check_health(port).await { 0 } else { 1 }
}

/// `true` when `/healthz` on the local port answers with a success status.
async fn check_health(port: u16) -> bool {
    let url = format!("http://127.0.0.1:{}/healthz", port);
    let Ok(client) = reqwest::Client::builder()
        .timeout(Duration::from_secs(1))
        .build()
    else {
        return false;
    };

    matches!(client.get(&url).send().await, Ok(res) if res.status().is_success())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
