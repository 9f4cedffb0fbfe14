use axum::{
    extract::State,
    routing::get,
    Extension, Router,
};
use tracing::info;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::db::models::role::Role;
use crate::db::models::user::{UpdateUserInput, User};
use crate::error::AppError;
use crate::middleware::auth::Principal;
use crate::utils::api_response::ApiResponse;
use crate::utils::validation::{PathId, Valid};

const USER_MANAGERS: [Role; 2] = [Role::Staff, Role::ServerAdmin];

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/pemohon", get(list_requesters))
        .route("/users/{id}", get(get_user).put(update_user).delete(delete_user))
}

/// Lists every account, newest first
#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    responses(
        (status = 200, description = "All users", body = [User]),
        (status = 403, description = "Server admin only")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<ApiResponse<Vec<User>>, AppError> {
    principal.require_role(&[Role::ServerAdmin])?;
    let users = state.store.list_users(None).await?;
    Ok(ApiResponse::ok("Users retrieved", users))
}

/// Lists `PEMOHON` accounts only
#[utoipa::path(
    get,
    path = "/users/pemohon",
    tag = "Users",
    responses(
        (status = 200, description = "Requester accounts", body = [User]),
        (status = 403, description = "Forbidden")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_requesters(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<ApiResponse<Vec<User>>, AppError> {
    principal.require_role(&USER_MANAGERS)?;
    let users = state.store.list_users(Some(Role::Requester)).await?;
    Ok(ApiResponse::ok("Pemohon retrieved", users))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
) -> Result<ApiResponse<User>, AppError> {
    principal.require_role(&USER_MANAGERS)?;
    let user = state
        .store
        .find_user(id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found."))?;
    Ok(ApiResponse::ok("User retrieved", user))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserInput,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Validation error"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already registered")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    Valid(changes): Valid<UpdateUserInput>,
) -> Result<ApiResponse<User>, AppError> {
    principal.require_role(&USER_MANAGERS)?;
    let user = state.store.update_user(id, changes).await?;
    // Cached principals carry the display name.
    state.principals.invalidate(&id);

    info!("✏️ User {} updated by {}", id, principal.user_id);
    Ok(ApiResponse::ok("User updated", user))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 403, description = "Server admin only"),
        (status = 404, description = "User not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
) -> Result<ApiResponse<()>, AppError> {
    principal.require_role(&[Role::ServerAdmin])?;
    state.store.delete_user(id).await?;
    state.principals.invalidate(&id);

    info!("🗑️ User {} deleted by {}", id, principal.user_id);
    Ok(ApiResponse::message("User deleted"))
}

#[derive(OpenApi)]
#[openapi(
    paths(list_users, list_requesters, get_user, update_user, delete_user),
    components(schemas(User, UpdateUserInput)),
    tags((name = "Users", description = "Account management"))
)]
pub struct UserDoc;
