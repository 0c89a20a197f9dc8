use log::{error, info};
use std::sync::Arc;

use toeic_server::core::shared::utils::{create_conn, run_migrations};
use toeic_server::{run_axum_server, AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .init();

    let config = AppConfig::load()?;
    info!(
        "Starting toeic-server {} on {}",
        env!("CARGO_PKG_VERSION"),
        config.bind_address()
    );

    let pool = create_conn(&config.database).map_err(|e| {
        error!("Failed to connect to database: {}", e);
        anyhow::anyhow!("Database connection failed: {e}")
    })?;

    if config.database.run_migrations {
        let migration_pool = pool.clone();
        tokio::task::spawn_blocking(move || run_migrations(&migration_pool))
            .await?
            .map_err(|e| anyhow::anyhow!("Migrations failed: {e}"))?;
    }

    let state = Arc::new(AppState::new(pool, config)?);
    run_axum_server(state).await?;

    info!("Server stopped");
    Ok(())
}
