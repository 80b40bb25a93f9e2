use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgConnectOptions;

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Full connection URL. When set it wins over the individual parts.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub statement_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub public_dir: String,
    pub database: DatabaseConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database = DatabaseConfig {
            url: std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            host: std::env::var("DB_HOST").unwrap_or_else(|_| "localhost".into()),
            port: parse_var("DB_PORT", 5432)?,
            user: std::env::var("DB_USER").unwrap_or_else(|_| "postgres".into()),
            password: std::env::var("DB_PASS").unwrap_or_default(),
            name: std::env::var("DB_NAME").unwrap_or_else(|_| "postgres".into()),
            max_connections: parse_var("DB_MAX_CONNECTIONS", 10)?,
            acquire_timeout: Duration::from_secs(parse_var("DB_ACQUIRE_TIMEOUT_SECS", 5)?),
            statement_timeout: Duration::from_millis(parse_var("DB_STATEMENT_TIMEOUT_MS", 5000)?),
        };
        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_var("PORT", 3000)?,
            public_dir: std::env::var("PUBLIC_DIR").unwrap_or_else(|_| "public".into()),
            database,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> anyhow::Result<PgConnectOptions> {
        let options = match &self.url {
            Some(url) => PgConnectOptions::from_str(url).context("parse DATABASE_URL")?,
            None => PgConnectOptions::new()
                .host(&self.host)
                .port(self.port)
                .username(&self.user)
                .password(&self.password)
                .database(&self.name),
        };
        let statement_timeout = format!("{}ms", self.statement_timeout.as_millis());
        Ok(options.options([("statement_timeout", statement_timeout.as_str())]))
    }
}

/// Reads an optional variable, falling back to `default` when it is unset.
fn parse_var<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 12] = [
        "DATABASE_URL",
        "DB_HOST",
        "DB_PORT",
        "DB_USER",
        "DB_PASS",
        "DB_NAME",
        "DB_MAX_CONNECTIONS",
        "DB_ACQUIRE_TIMEOUT_SECS",
        "DB_STATEMENT_TIMEOUT_MS",
        "APP_HOST",
        "PORT",
        "PUBLIC_DIR",
    ];

    /// Every known variable unset, except the given overrides.
    fn env_with(
        overrides: &[(&'static str, &'static str)],
    ) -> Vec<(&'static str, Option<&'static str>)> {
        VARS.iter()
            .map(|k| {
                let value = overrides.iter().find(|(o, _)| o == k).map(|(_, v)| *v);
                (*k, value)
            })
            .collect()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        temp_env::with_vars(env_with(&[]), || {
            let cfg = AppConfig::from_env().expect("defaults should load");
            assert_eq!(cfg.port, 3000);
            assert_eq!(cfg.host, "0.0.0.0");
            assert_eq!(cfg.public_dir, "public");
            assert_eq!(cfg.database.url, None);
            assert_eq!(cfg.database.host, "localhost");
            assert_eq!(cfg.database.port, 5432);
            assert_eq!(cfg.database.max_connections, 10);
            assert_eq!(cfg.database.acquire_timeout, Duration::from_secs(5));
            assert_eq!(cfg.database.statement_timeout, Duration::from_millis(5000));
            assert_eq!(cfg.listen_addr(), "0.0.0.0:3000");
        });
    }

    #[test]
    fn reads_database_parts_and_port() {
        let vars = env_with(&[
            ("DB_HOST", "db.internal"),
            ("DB_PORT", "6543"),
            ("DB_USER", "app"),
            ("DB_PASS", "secret"),
            ("DB_NAME", "signup"),
            ("PORT", "8081"),
        ]);
        temp_env::with_vars(vars, || {
            let cfg = AppConfig::from_env().expect("config should load");
            assert_eq!(cfg.port, 8081);
            assert_eq!(cfg.database.host, "db.internal");
            assert_eq!(cfg.database.port, 6543);
            assert_eq!(cfg.database.user, "app");
            assert_eq!(cfg.database.password, "secret");
            assert_eq!(cfg.database.name, "signup");
            assert!(cfg.database.connect_options().is_ok());
        });
    }

    #[test]
    fn rejects_malformed_port() {
        let vars = env_with(&[("PORT", "eighty")]);
        temp_env::with_vars(vars, || {
            let err = AppConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("PORT"));
        });
    }

    #[test]
    fn database_url_takes_precedence() {
        let vars = env_with(&[("DATABASE_URL", "postgres://u:p@elsewhere:5433/other")]);
        temp_env::with_vars(vars, || {
            let cfg = AppConfig::from_env().expect("config should load");
            assert_eq!(
                cfg.database.url.as_deref(),
                Some("postgres://u:p@elsewhere:5433/other")
            );
            assert!(cfg.database.connect_options().is_ok());
        });
    }
}
