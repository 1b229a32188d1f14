use std::sync::Arc;

use diesel::{
    pg::PgConnection,
    r2d2::{ConnectionManager, PooledConnection},
};

use crate::{
    config::AppConfig,
    db::PgPool,
    error::{AppError, AppResult},
};

type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(pool: PgPool, config: AppConfig) -> Self {
        Self {
            pool,
            config: Arc::new(config),
        }
    }

    /// Checks out a connection, waiting at most the pool's acquire timeout.
    pub fn db(&self) -> AppResult<PgPooledConnection> {
        self.pool.get().map_err(|err| {
            tracing::warn!(error = %err, "database pool exhausted or unreachable");
            AppError::unavailable(format!("database unavailable: {err}"))
        })
    }
}
