use axum::{
    extract::State,
    routing::get,
    Extension, Router,
};
use utoipa::OpenApi;

use crate::api::{accessible_request, record_changed, record_created};
use crate::app_state::AppState;
use crate::db::models::audit::AuditAction;
use crate::db::models::lifecycle::{FollowUp, FollowUpInput, RecordKind};
use crate::db::models::role::Role;
use crate::error::AppError;
use crate::middleware::auth::Principal;
use crate::utils::api_response::ApiResponse;
use crate::utils::validation::{Patch, PathId, Valid};

const KIND: RecordKind = RecordKind::FollowUp;
const ROLES: [Role; 1] = [Role::ServerAdmin];

pub fn follow_up_routes() -> Router<AppState> {
    Router::new().route(
        "/pengajuan/{id}/tindak-lanjut",
        get(get_follow_up)
            .post(create_follow_up)
            .patch(update_follow_up)
            .delete(delete_follow_up),
    )
}

fn describe(follow_up: &FollowUp) -> String {
    match follow_up.ends_on {
        Some(ends_on) => format!(
            "Mulai: {} | Selesai: {}",
            follow_up.starts_on.to_rfc3339(),
            ends_on.to_rfc3339()
        ),
        None => format!("Mulai: {}", follow_up.starts_on.to_rfc3339()),
    }
}

#[utoipa::path(
    get,
    path = "/pengajuan/{id}/tindak-lanjut",
    tag = "Tindak Lanjut",
    params(("id" = i32, Path, description = "Pengajuan ID")),
    responses(
        (status = 200, description = "Follow-up record", body = FollowUp),
        (status = 404, description = "Pengajuan or follow-up not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_follow_up(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
) -> Result<ApiResponse<FollowUp>, AppError> {
    principal.require_role(&ROLES)?;
    accessible_request(&state, &principal, id).await?;

    let follow_up = state
        .store
        .find_follow_up(id)
        .await?
        .ok_or_else(|| AppError::not_found("Tindak lanjut not found."))?;
    Ok(ApiResponse::ok("Tindak lanjut retrieved", follow_up))
}

/// Schedules provisioning work and moves the request to `DIPROSES`.
#[utoipa::path(
    post,
    path = "/pengajuan/{id}/tindak-lanjut",
    tag = "Tindak Lanjut",
    params(("id" = i32, Path, description = "Pengajuan ID")),
    request_body = FollowUpInput,
    responses(
        (status = 201, description = "Follow-up created", body = FollowUp),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Pengajuan not found"),
        (status = 409, description = "Follow-up already exists")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_follow_up(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    Valid(payload): Valid<FollowUpInput>,
) -> Result<ApiResponse<FollowUp>, AppError> {
    principal.require_role(&ROLES)?;
    accessible_request(&state, &principal, id).await?;

    let follow_up = state.store.create_follow_up(id, payload).await?;
    record_created(&state, &principal, KIND, id, describe(&follow_up)).await?;
    Ok(ApiResponse::created("Tindak lanjut created", follow_up))
}

#[utoipa::path(
    patch,
    path = "/pengajuan/{id}/tindak-lanjut",
    tag = "Tindak Lanjut",
    params(("id" = i32, Path, description = "Pengajuan ID")),
    request_body = FollowUpInput,
    responses(
        (status = 200, description = "Follow-up updated", body = FollowUp),
        (status = 400, description = "Validation error or empty update"),
        (status = 404, description = "Follow-up not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_follow_up(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    Valid(changes): Valid<Patch<FollowUpInput>>,
) -> Result<ApiResponse<FollowUp>, AppError> {
    principal.require_role(&ROLES)?;
    accessible_request(&state, &principal, id).await?;

    let follow_up = state.store.update_follow_up(id, changes).await?;
    record_changed(&state, &principal, id, AuditAction::RecordUpdated(KIND), describe(&follow_up)).await;
    Ok(ApiResponse::ok("Tindak lanjut updated", follow_up))
}

#[utoipa::path(
    delete,
    path = "/pengajuan/{id}/tindak-lanjut",
    tag = "Tindak Lanjut",
    params(("id" = i32, Path, description = "Pengajuan ID")),
    responses(
        (status = 200, description = "Follow-up deleted"),
        (status = 404, description = "Follow-up not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_follow_up(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
) -> Result<ApiResponse<()>, AppError> {
    principal.require_role(&ROLES)?;
    accessible_request(&state, &principal, id).await?;

    state.store.delete_record(KIND, id).await?;
    record_changed(&state, &principal, id, AuditAction::RecordDeleted(KIND), "Delete tindak lanjut").await;
    Ok(ApiResponse::message("Tindak lanjut deleted"))
}

#[derive(OpenApi)]
#[openapi(
    paths(get_follow_up, create_follow_up, update_follow_up, delete_follow_up),
    components(schemas(FollowUp, FollowUpInput)),
    tags((name = "Tindak Lanjut", description = "Provisioning follow-up schedule"))
)]
pub struct FollowUpDoc;
