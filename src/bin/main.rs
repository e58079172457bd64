use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use training_service::app::{AppState, create_app};
use training_service::audit::ChannelAuditSink;
use training_service::bootstrap::connect_and_migrate;
use training_service::{config::APP_CONFIG, utils::tracing::init_standard_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    init_standard_tracing(env!("CARGO_CRATE_NAME"), &APP_CONFIG.log_level);

    tracing::info!("Starting application in {} mode...", APP_CONFIG.app_env);

    let db = connect_and_migrate(&APP_CONFIG.database_url).await?;
    let audit = Arc::new(ChannelAuditSink::spawn(APP_CONFIG.audit_buffer_size));

    let app = create_app(AppState::new(db, audit), &APP_CONFIG);

    let http_address = format!("0.0.0.0:{}", APP_CONFIG.port);
    tracing::info!("HTTP server listening on {}", &http_address);

    let listener = tokio::net::TcpListener::bind(&http_address)
        .await
        .with_context(|| format!("Failed to bind {http_address}"))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("HTTP server stopped unexpectedly")?;

    Ok(())
}
