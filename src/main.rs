use std::path::PathBuf;
use std::sync::Arc;

use delivery_tracker::store::RedbStore;
use delivery_tracker::tracker::TrackerManager;
use delivery_tracker::utils::logger::init_logger_with_file;
use delivery_tracker::Config;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = Config::from_env();

    let work_dir = PathBuf::from(&config.work_dir);
    if !work_dir.exists() {
        std::fs::create_dir_all(&work_dir).expect("Failed to create work directory");
    }
    let log_dir = work_dir.join("logs");
    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir).expect("Failed to create log directory");
    }

    init_logger_with_file(&config, &log_dir);

    tracing::info!("delivery tracker starting");

    let store = RedbStore::open(work_dir.join("orders.redb")).expect("Failed to open order database");
    let store: Arc<RedbStore> = Arc::new(store);

    let (manager, mut updates) = TrackerManager::from_config(&config, store);

    // Restart workers for orders interrupted by the previous shutdown
    manager.resume_active_orders().await;

    // Downstream consumer: the chat-bot frontend sits on the other side of
    // this channel; the daemon itself only logs what it forwards.
    let consumer = tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            tracing::info!(
                uuid = %update.uuid,
                status = %update.last_status,
                progress = update.last_progress,
                eta_minutes = update.eta_minutes,
                text = %update.last_text,
                "order update"
            );
        }
        tracing::info!("update channel closed");
    });

    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for shutdown signal");
    tracing::info!("shutdown signal received");

    manager.shutdown().await;
    let _ = consumer.await;

    tracing::info!("delivery tracker stopped");
}
