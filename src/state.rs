use crate::config::AppConfig;
use crate::db;
use crate::users::repo::{PgUserStore, UserStore};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn UserStore>,
}

impl AppState {
    /// Loads configuration and opens the pool. The pool is returned alongside
    /// the state so the caller can close it after the server drains.
    pub async fn init() -> anyhow::Result<(Self, PgPool)> {
        let config = Arc::new(AppConfig::from_env()?);
        let pool = db::connect(&config.database).await?;
        let store = Arc::new(PgUserStore::new(pool.clone())) as Arc<dyn UserStore>;
        Ok((Self::from_parts(config, store), pool))
    }

    pub fn from_parts(config: Arc<AppConfig>, store: Arc<dyn UserStore>) -> Self {
        Self { config, store }
    }

    #[cfg(test)]
    pub fn fake(store: Arc<dyn UserStore>) -> Self {
        use crate::config::DatabaseConfig;
        use std::time::Duration;

        let config = Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            public_dir: "public".into(),
            database: DatabaseConfig {
                url: None,
                host: "localhost".into(),
                port: 5432,
                user: "postgres".into(),
                password: String::new(),
                name: "postgres".into(),
                max_connections: 1,
                acquire_timeout: Duration::from_secs(1),
                statement_timeout: Duration::from_millis(500),
            },
        });
        Self::from_parts(config, store)
    }
}
