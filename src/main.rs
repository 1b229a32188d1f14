use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use tender_service::{config::AppConfig, db, routes, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        component = "server",
        database_url = %config.redacted_database_url(),
        pool_size = config.database_max_pool_size,
        acquire_timeout_secs = config.database_acquire_timeout.as_secs(),
        server_address = %config.server_address,
        run_migrations = config.run_migrations,
        "loaded configuration"
    );

    let pool = db::connect(&config).await?;
    if config.run_migrations {
        db::run_migrations(&pool)?;
    }

    let state = AppState::new(pool, config);
    let listener = TcpListener::bind(state.config.server_address.as_str()).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    let router = routes::create_router(state);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("server received shutdown signal");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
