use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{info, warn};

use crate::config::DatabaseConfig;

/// Opens the bounded connection pool and checks that the database answers.
pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(config.connect_options()?)
        .await
        .context("connect to database")?;

    info!(
        max_connections = config.max_connections,
        acquire_timeout_secs = config.acquire_timeout.as_secs(),
        "postgres pool ready"
    );
    Ok(pool)
}

pub async fn migrate(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("run migrations")?;
    Ok(())
}

/// Waits for checked-out connections to come back, then closes the pool.
pub async fn close(pool: PgPool) {
    if pool.is_closed() {
        warn!("pool already closed");
        return;
    }
    pool.close().await;
    info!("postgres pool closed");
}
