use std::time::Duration;

use anyhow::{anyhow, Context};
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::AppConfig;

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

pub const DEFAULT_MAX_POOL_SIZE: u32 = 4;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[derive(Clone, Copy, Debug)]
pub struct ConnectPolicy {
    pub attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl ConnectPolicy {
    /// Delay before retry number `attempt` (zero based): doubles each time, capped at
    /// `max_backoff`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

pub fn init_pool_with_size(
    database_url: &str,
    max_size: u32,
    acquire_timeout: Duration,
) -> anyhow::Result<PgPool> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool_size = max_size.max(1);
    let pool = Pool::builder()
        .max_size(pool_size)
        .connection_timeout(acquire_timeout)
        .build(manager)?;
    Ok(pool)
}

/// Builds the pool, retrying with exponential backoff until the store answers or the
/// policy runs out of attempts.
pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let policy = config.connect_policy();
    let attempts = policy.attempts.max(1);

    for attempt in 0..attempts {
        match init_pool_with_size(
            &config.database_url,
            config.database_max_pool_size,
            config.database_acquire_timeout,
        ) {
            Ok(pool) => {
                info!(attempt = attempt + 1, "postgres connected");
                return Ok(pool);
            }
            Err(err) if attempt + 1 < attempts => {
                let delay = policy.backoff(attempt);
                warn!(
                    attempt = attempt + 1,
                    attempts_left = attempts - attempt - 1,
                    retry_in_ms = delay.as_millis() as u64,
                    error = %err,
                    "postgres is not reachable yet"
                );
                sleep(delay).await;
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("failed to connect to postgres after {attempts} attempts")
                });
            }
        }
    }

    Err(anyhow!("no connection attempts were made"))
}

pub fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    let mut conn = pool.get().context("failed to acquire migration connection")?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| anyhow!("failed to run migrations: {err}"))?;
    info!(applied = applied.len(), "database migrations applied");
    Ok(())
}
