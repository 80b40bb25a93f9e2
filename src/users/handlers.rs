use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
    users::{
        dto::ApiResponse,
        extractors::JsonObject,
        password::hash_password_blocking,
        repo_types::{PublicUser, UserChanges},
        validation::{self, parse_user_id},
    },
};

const USER_NOT_FOUND: &str = "User not found";

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

fn user_id(raw: &str) -> ApiResult<i32> {
    parse_user_id(raw).map_err(|e| {
        warn!(id = %raw, "invalid user id");
        e.into()
    })
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<PublicUser>>>> {
    let users = state.store.list().await?;
    // An empty table answers 404, not an empty array.
    if users.is_empty() {
        return Err(ApiError::NotFound("No users found!".into()));
    }
    Ok(Json(ApiResponse::data(users)))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<PublicUser>>> {
    let id = user_id(&id)?;
    let user = state
        .store
        .find(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(USER_NOT_FOUND.into()))?;
    Ok(Json(ApiResponse::data(user)))
}

#[instrument(skip(state, body))]
pub async fn create_user(
    State(state): State<AppState>,
    JsonObject(body): JsonObject,
) -> ApiResult<(StatusCode, Json<ApiResponse<PublicUser>>)> {
    let new_user = validation::new_user(&body).map_err(|e| {
        warn!(field = e.field, reason = e.message, "create user rejected");
        ApiError::from(e)
    })?;

    let hash = hash_password_blocking(new_user.password).await?;
    let user = state.store.insert(&new_user.email, &hash).await?;

    info!(user_id = user.id, "user created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "User created successfully",
            PublicUser::from(user),
        )),
    ))
}

#[instrument(skip(state, body))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<JsonObject, ApiError>,
) -> ApiResult<Json<ApiResponse<PublicUser>>> {
    let id = user_id(&id)?;
    let JsonObject(body) = body?;
    let patch = validation::user_patch(&body).map_err(|e| {
        warn!(user_id = id, field = e.field, reason = e.message, "update user rejected");
        ApiError::from(e)
    })?;

    let password_hash = match patch.password {
        Some(plain) => Some(hash_password_blocking(plain).await?),
        None => None,
    };
    let changes = UserChanges {
        email: patch.email,
        password_hash,
    };
    if changes.is_empty() {
        return Err(ApiError::Validation("Nothing to update".into()));
    }

    let user = state
        .store
        .update(id, &changes)
        .await?
        .ok_or_else(|| ApiError::NotFound(USER_NOT_FOUND.into()))?;

    info!(
        user_id = user.id,
        email = changes.email.is_some(),
        password = changes.password_hash.is_some(),
        "user updated"
    );
    Ok(Json(ApiResponse::with_message("User updated successfully", user)))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<PublicUser>>> {
    let id = user_id(&id)?;
    let user = state
        .store
        .delete(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(USER_NOT_FOUND.into()))?;

    info!(user_id = user.id, "user deleted");
    Ok(Json(ApiResponse::with_message(
        "User deleted successfully",
        PublicUser::from(user),
    )))
}
