use axum::{
    extract::State,
    routing::get,
    Extension, Router,
};
use utoipa::OpenApi;

use crate::api::{accessible_request, record_changed, record_created};
use crate::app_state::AppState;
use crate::db::models::audit::AuditAction;
use crate::db::models::lifecycle::{Backup, BackupInput, RecordKind};
use crate::db::models::role::Role;
use crate::error::AppError;
use crate::middleware::auth::Principal;
use crate::utils::api_response::ApiResponse;
use crate::utils::validation::{Patch, PathId, Valid};

const KIND: RecordKind = RecordKind::Backup;
/// Requesters are limited to their own requests by the ownership guard.
const ROLES: [Role; 2] = [Role::Requester, Role::ServerAdmin];

pub fn backup_routes() -> Router<AppState> {
    Router::new().route(
        "/pengajuan/{id}/backup",
        get(get_backup)
            .post(create_backup)
            .patch(update_backup)
            .delete(delete_backup),
    )
}

fn describe(backup: &Backup) -> String {
    match backup.last_run {
        Some(last_run) => format!("Periode: {} | Terakhir: {}", backup.period, last_run.to_rfc3339()),
        None => format!("Periode: {}", backup.period),
    }
}

#[utoipa::path(
    get,
    path = "/pengajuan/{id}/backup",
    tag = "Backup",
    params(("id" = i32, Path, description = "Pengajuan ID")),
    responses(
        (status = 200, description = "Backup record", body = Backup),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Pengajuan or backup not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_backup(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
) -> Result<ApiResponse<Backup>, AppError> {
    principal.require_role(&ROLES)?;
    accessible_request(&state, &principal, id).await?;

    let backup = state
        .store
        .find_backup(id)
        .await?
        .ok_or_else(|| AppError::not_found("Backup not found."))?;
    Ok(ApiResponse::ok("Backup retrieved", backup))
}

#[utoipa::path(
    post,
    path = "/pengajuan/{id}/backup",
    tag = "Backup",
    params(("id" = i32, Path, description = "Pengajuan ID")),
    request_body = BackupInput,
    responses(
        (status = 201, description = "Backup created", body = Backup),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Pengajuan not found"),
        (status = 409, description = "Backup already exists")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_backup(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    Valid(payload): Valid<BackupInput>,
) -> Result<ApiResponse<Backup>, AppError> {
    principal.require_role(&ROLES)?;
    accessible_request(&state, &principal, id).await?;

    let backup = state.store.create_backup(id, payload).await?;
    record_created(&state, &principal, KIND, id, describe(&backup)).await?;
    Ok(ApiResponse::created("Backup created", backup))
}

#[utoipa::path(
    patch,
    path = "/pengajuan/{id}/backup",
    tag = "Backup",
    params(("id" = i32, Path, description = "Pengajuan ID")),
    request_body = BackupInput,
    responses(
        (status = 200, description = "Backup updated", body = Backup),
        (status = 400, description = "Validation error or empty update"),
        (status = 404, description = "Backup not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_backup(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    Valid(changes): Valid<Patch<BackupInput>>,
) -> Result<ApiResponse<Backup>, AppError> {
    principal.require_role(&ROLES)?;
    accessible_request(&state, &principal, id).await?;

    let backup = state.store.update_backup(id, changes).await?;
    record_changed(&state, &principal, id, AuditAction::RecordUpdated(KIND), describe(&backup)).await;
    Ok(ApiResponse::ok("Backup updated", backup))
}

#[utoipa::path(
    delete,
    path = "/pengajuan/{id}/backup",
    tag = "Backup",
    params(("id" = i32, Path, description = "Pengajuan ID")),
    responses(
        (status = 200, description = "Backup deleted"),
        (status = 404, description = "Backup not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_backup(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
) -> Result<ApiResponse<()>, AppError> {
    principal.require_role(&ROLES)?;
    accessible_request(&state, &principal, id).await?;

    state.store.delete_record(KIND, id).await?;
    record_changed(&state, &principal, id, AuditAction::RecordDeleted(KIND), "Delete backup").await;
    Ok(ApiResponse::message("Backup deleted"))
}

#[derive(OpenApi)]
#[openapi(
    paths(get_backup, create_backup, update_backup, delete_backup),
    components(schemas(Backup, BackupInput)),
    tags((name = "Backup", description = "Backup schedule of a provisioned server"))
)]
pub struct BackupDoc;
