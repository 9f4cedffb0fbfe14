use axum::{
    extract::State,
    routing::get,
    Extension, Router,
};
use utoipa::OpenApi;

use crate::api::{accessible_request, record_changed, record_created};
use crate::app_state::AppState;
use crate::db::models::audit::AuditAction;
use crate::db::models::lifecycle::{Archive, ArchiveInput, RecordKind};
use crate::db::models::role::Role;
use crate::error::AppError;
use crate::middleware::auth::Principal;
use crate::utils::api_response::ApiResponse;
use crate::utils::validation::{Patch, PathId, Valid};

const KIND: RecordKind = RecordKind::Archive;
const ROLES: [Role; 1] = [Role::ServerAdmin];

pub fn archive_routes() -> Router<AppState> {
    Router::new().route(
        "/pengajuan/{id}/arsip",
        get(get_archive)
            .post(create_archive)
            .patch(update_archive)
            .delete(delete_archive),
    )
}

#[utoipa::path(
    get,
    path = "/pengajuan/{id}/arsip",
    tag = "Arsip",
    params(("id" = i32, Path, description = "Pengajuan ID")),
    responses(
        (status = 200, description = "Archive record", body = Archive),
        (status = 404, description = "Pengajuan or archive not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_archive(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
) -> Result<ApiResponse<Archive>, AppError> {
    principal.require_role(&ROLES)?;
    accessible_request(&state, &principal, id).await?;

    let archive = state
        .store
        .find_archive(id)
        .await?
        .ok_or_else(|| AppError::not_found("Arsip not found."))?;
    Ok(ApiResponse::ok("Arsip retrieved", archive))
}

#[utoipa::path(
    post,
    path = "/pengajuan/{id}/arsip",
    tag = "Arsip",
    params(("id" = i32, Path, description = "Pengajuan ID")),
    request_body = ArchiveInput,
    responses(
        (status = 201, description = "Archive created", body = Archive),
        (status = 404, description = "Pengajuan not found"),
        (status = 409, description = "Archive already exists")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_archive(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    Valid(payload): Valid<ArchiveInput>,
) -> Result<ApiResponse<Archive>, AppError> {
    principal.require_role(&ROLES)?;
    accessible_request(&state, &principal, id).await?;

    let archive = state.store.create_archive(id, payload).await?;
    let detail = archive.note.clone().unwrap_or_else(|| "-".to_string());
    record_created(&state, &principal, KIND, id, detail).await?;
    Ok(ApiResponse::created("Arsip created", archive))
}

#[utoipa::path(
    patch,
    path = "/pengajuan/{id}/arsip",
    tag = "Arsip",
    params(("id" = i32, Path, description = "Pengajuan ID")),
    request_body = ArchiveInput,
    responses(
        (status = 200, description = "Archive updated", body = Archive),
        (status = 400, description = "catatan missing"),
        (status = 404, description = "Archive not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_archive(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    Valid(changes): Valid<Patch<ArchiveInput>>,
) -> Result<ApiResponse<Archive>, AppError> {
    principal.require_role(&ROLES)?;
    accessible_request(&state, &principal, id).await?;

    let archive = state.store.update_archive(id, changes).await?;
    record_changed(&state, &principal, id, AuditAction::RecordUpdated(KIND), "Update arsip").await;
    Ok(ApiResponse::ok("Arsip updated", archive))
}

#[utoipa::path(
    delete,
    path = "/pengajuan/{id}/arsip",
    tag = "Arsip",
    params(("id" = i32, Path, description = "Pengajuan ID")),
    responses(
        (status = 200, description = "Archive deleted"),
        (status = 404, description = "Archive not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_archive(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
) -> Result<ApiResponse<()>, AppError> {
    principal.require_role(&ROLES)?;
    accessible_request(&state, &principal, id).await?;

    state.store.delete_record(KIND, id).await?;
    record_changed(&state, &principal, id, AuditAction::RecordDeleted(KIND), "Delete arsip").await;
    Ok(ApiResponse::message("Arsip deleted"))
}

#[derive(OpenApi)]
#[openapi(
    paths(get_archive, create_archive, update_archive, delete_archive),
    components(schemas(Archive, ArchiveInput)),
    tags((name = "Arsip", description = "Archive notes for closed requests"))
)]
pub struct ArchiveDoc;
