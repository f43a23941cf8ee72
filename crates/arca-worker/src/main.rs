use anyhow::Result;
use arca_core::telemetry::init_telemetry;
use arca_core::Config;
use arca_db::PgAssetStore;
use arca_worker::{Processor, Worker};
use std::sync::Arc;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_telemetry(&config.environment);

    let pool = arca_db::setup_pool(&config).await?;
    let store = Arc::new(PgAssetStore::new(pool));
    let storage = arca_storage::create_storage(&config).await?;
    let channel = arca_queue::create_channel(&config).await?;

    // Subscribe only to the topic of the configured backend; other backends'
    // messages are never delivered here.
    let topic = storage.backend_type().as_str().to_string();

    let processor = Processor::new(storage, store, config.worker_max_metadata_attempts);
    let worker = Worker::new(processor, channel, topic, config.worker_concurrency);

    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            let _ = shutdown_tx.send(()).await;
        }
    });

    worker.run(shutdown_rx).await
}
