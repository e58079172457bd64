//! One-off repair: marks retained allocations of closed batches as completed.

use std::sync::Arc;

use training_service::audit::{Actor, ChannelAuditSink};
use training_service::bootstrap::connect_and_migrate;
use training_service::services::CompletionBackfill;
use training_service::{config::APP_CONFIG, utils::tracing::init_standard_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    init_standard_tracing(env!("CARGO_CRATE_NAME"), &APP_CONFIG.log_level);

    let db = connect_and_migrate(&APP_CONFIG.database_url).await?;
    let audit = Arc::new(ChannelAuditSink::spawn(APP_CONFIG.audit_buffer_size));

    let report = CompletionBackfill::new(db, audit)
        .fix_closed_batch_allocations(&Actor::system())
        .await?;

    tracing::info!(
        batches_processed = report.batches_processed,
        allocations_updated = report.allocations_updated,
        "Completion backfill finished"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);

    // Let the audit writer drain before the runtime shuts down.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    Ok(())
}
