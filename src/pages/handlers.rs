use axum::{response::Html, routing::get, Router};
use tracing::instrument;

use crate::{
    error::{ApiError, ApiResult},
    pages::views,
    state::AppState,
};

pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/register", get(register))
        .route("/register/", get(register))
        .route("/login", get(login))
        .route("/login/", get(login))
}

fn render(view: &str, title: &str) -> ApiResult<Html<String>> {
    views::render(view, title)
        .map(Html)
        .map_err(|e| ApiError::Internal(e.into()))
}

#[instrument]
pub async fn home() -> ApiResult<Html<String>> {
    render("index", "Home")
}

#[instrument]
pub async fn register() -> ApiResult<Html<String>> {
    render("register", "Register")
}

#[instrument]
pub async fn login() -> ApiResult<Html<String>> {
    render("login", "Login")
}
