//! Appraisal HTTP server entrypoint.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use appraisal::config::Config;
use appraisal::constants::DEFAULT_REQUEUE_LIMIT;
use appraisal::domain::{Category, FragmentMetadata};
use appraisal::extract::{FileTextExtractor, normalize_text};
use appraisal::gateway::{HandlerState, create_router_with_state};
use appraisal::pipeline::EvaluationPipeline;
use appraisal::queue::JobQueue;
use appraisal::retrieval::{Embedder, HashEmbedder, HttpEmbedder, VectorRetriever};
use appraisal::scoring::{KeywordScorer, LlmScorer, Scorer};
use appraisal::service::EvaluationService;
use appraisal::store::Stores;
use appraisal::vectordb::QdrantClient;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const USAGE: &str = "usage: appraisal [--health-check | --ingest <category> <path>]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check().await);
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    let embedder: Arc<dyn Embedder> = if config.mock_provider {
        tracing::warn!("APPRAISAL_MOCK_PROVIDER set, using hash embedder and keyword scorer");
        Arc::new(HashEmbedder::new(config.embedding_dim))
    } else {
        Arc::new(HttpEmbedder::new(
            config.embedding_url.clone(),
            config.embedding_model.clone(),
            config.embedding_dim,
        ))
    };

    let qdrant = Arc::new(QdrantClient::new(&config.qdrant_url).await?);
    if let Err(e) = qdrant.health_check().await {
        tracing::warn!(url = qdrant.url(), "Qdrant health check failed: {}", e);
    }
    let retriever = VectorRetriever::new(embedder, qdrant, config.collection.clone());
    retriever.ensure_collection().await?;

    if let Some(pos) = args.iter().position(|arg| arg == "--ingest") {
        let (Some(category), Some(path)) = (args.get(pos + 1), args.get(pos + 2)) else {
            anyhow::bail!(USAGE);
        };
        return ingest(&retriever, category, Path::new(path)).await;
    }

    let addr: SocketAddr = config.socket_addr().parse()?;
    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        workers = config.worker_count,
        capacity = config.queue_capacity,
        "Appraisal starting"
    );

    tokio::fs::create_dir_all(&config.storage_path)
        .await
        .with_context(|| format!("creating {}", config.storage_path.display()))?;

    let scorer: Arc<dyn Scorer> = if config.mock_provider {
        Arc::new(KeywordScorer::new())
    } else {
        Arc::new(
            LlmScorer::new(config.llm_model.clone())
                .with_sampling(config.llm_temperature, config.llm_max_tokens),
        )
    };

    let stores = Stores::in_memory();
    let pipeline = EvaluationPipeline::new(
        stores.clone(),
        Arc::new(FileTextExtractor::new()),
        Arc::new(retriever),
        scorer,
    )
    .with_config(config.pipeline_config());

    let queue = Arc::new(JobQueue::new(config.queue_config(), Arc::new(pipeline))?);
    let service = Arc::new(EvaluationService::new(
        stores,
        Arc::clone(&queue),
        config.storage_path.clone(),
    ));

    queue.start().await?;
    let requeued = service.requeue_pending(DEFAULT_REQUEUE_LIMIT).await?;
    if requeued > 0 {
        tracing::info!(requeued, "Recovered pending jobs");
    }

    let app = create_router_with_state(HandlerState::new(service));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped, draining job queue");
    queue.stop().await;

    tracing::info!("Appraisal shutdown complete");
    Ok(())
}

async fn ingest(
    retriever: &VectorRetriever<QdrantClient>,
    category: &str,
    path: &Path,
) -> anyhow::Result<()> {
    let category: Category = category.parse()?;
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;

    let source = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(category.as_str());
    let metadata = FragmentMetadata::new()
        .with_source(source)
        .with_version("1.0");

    let chunks = retriever
        .ingest(&normalize_text(&raw), category, metadata)
        .await?;
    tracing::info!(%category, path = %path.display(), chunks, "Ingestion complete");
    Ok(())
}

async fn run_health_check() -> i32 {
    let port = std::env::var("APPRAISAL_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);

    let url = format!("http://127.0.0.1:{}/healthz", port);

    let Ok(client) = reqwest::Client::builder()
        .timeout(Duration::from_secs(1))
        .build()
    else {
        return 1;
    };

    match client.get(&url).send().await {
        Ok(res) if res.status().is_success() => 0,
        _ => 1,
    }
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
