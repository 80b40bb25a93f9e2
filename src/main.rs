mod app;
mod config;
mod db;
mod error;
mod pages;
mod state;
mod users;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "signup=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let (app_state, pool) = AppState::init().await?;

    if let Err(e) = db::migrate(&pool).await {
        tracing::warn!(error = %format!("{e:#}"), "migration failed; continuing");
    }

    let addr = app_state.config.listen_addr();
    let result = app::serve(app::build_app(app_state), &addr).await;

    db::close(pool).await;
    result
}
