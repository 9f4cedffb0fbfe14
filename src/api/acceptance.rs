use axum::{
    extract::State,
    routing::get,
    Extension, Router,
};
use tracing::info;
use utoipa::OpenApi;

use crate::api::{accessible_request, record_changed, record_created};
use crate::app_state::AppState;
use crate::db::models::audit::AuditAction;
use crate::db::models::lifecycle::{Acceptance, AcceptanceInput, RecordKind};
use crate::db::models::role::Role;
use crate::error::AppError;
use crate::middleware::auth::Principal;
use crate::utils::api_response::ApiResponse;
use crate::utils::validation::{Patch, PathId, Valid};

const KIND: RecordKind = RecordKind::Acceptance;
const ROLES: [Role; 1] = [Role::ServerAdmin];

pub fn acceptance_routes() -> Router<AppState> {
    Router::new().route(
        "/pengajuan/{id}/penerimaan",
        get(get_acceptance)
            .post(create_acceptance)
            .patch(update_acceptance)
            .delete(delete_acceptance),
    )
}

#[utoipa::path(
    get,
    path = "/pengajuan/{id}/penerimaan",
    tag = "Penerimaan",
    params(("id" = i32, Path, description = "Pengajuan ID")),
    responses(
        (status = 200, description = "Acceptance record", body = Acceptance),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Pengajuan or acceptance not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_acceptance(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
) -> Result<ApiResponse<Acceptance>, AppError> {
    principal.require_role(&ROLES)?;
    accessible_request(&state, &principal, id).await?;

    let acceptance = state
        .store
        .find_acceptance(id)
        .await?
        .ok_or_else(|| AppError::not_found("Penerimaan not found."))?;
    Ok(ApiResponse::ok("Penerimaan retrieved", acceptance))
}

/// Records the hand-over of the provisioned server and marks the request `DISELESAIKAN`.
#[utoipa::path(
    post,
    path = "/pengajuan/{id}/penerimaan",
    tag = "Penerimaan",
    params(("id" = i32, Path, description = "Pengajuan ID")),
    request_body = AcceptanceInput,
    responses(
        (status = 201, description = "Acceptance created", body = Acceptance),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Pengajuan not found"),
        (status = 409, description = "Acceptance already exists")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_acceptance(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    Valid(payload): Valid<AcceptanceInput>,
) -> Result<ApiResponse<Acceptance>, AppError> {
    principal.require_role(&ROLES)?;
    accessible_request(&state, &principal, id).await?;

    let acceptance = state.store.create_acceptance(id, payload).await?;
    let detail = format!(
        "CPU: {} | RAM: {} | Storage: {} | OS: {}",
        acceptance.cpu_cores, acceptance.ram_gb, acceptance.storage_gb, acceptance.operating_system
    );
    record_created(&state, &principal, KIND, id, detail).await?;

    info!("📦 Penerimaan recorded for pengajuan {}", id);
    Ok(ApiResponse::created("Penerimaan created", acceptance))
}

#[utoipa::path(
    patch,
    path = "/pengajuan/{id}/penerimaan",
    tag = "Penerimaan",
    params(("id" = i32, Path, description = "Pengajuan ID")),
    request_body = AcceptanceInput,
    responses(
        (status = 200, description = "Acceptance updated", body = Acceptance),
        (status = 400, description = "Validation error or empty update"),
        (status = 404, description = "Acceptance not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_acceptance(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    Valid(changes): Valid<Patch<AcceptanceInput>>,
) -> Result<ApiResponse<Acceptance>, AppError> {
    principal.require_role(&ROLES)?;
    accessible_request(&state, &principal, id).await?;

    let acceptance = state.store.update_acceptance(id, changes).await?;
    record_changed(&state, &principal, id, AuditAction::RecordUpdated(KIND), "Update penerimaan").await;
    Ok(ApiResponse::ok("Penerimaan updated", acceptance))
}

#[utoipa::path(
    delete,
    path = "/pengajuan/{id}/penerimaan",
    tag = "Penerimaan",
    params(("id" = i32, Path, description = "Pengajuan ID")),
    responses(
        (status = 200, description = "Acceptance deleted"),
        (status = 404, description = "Acceptance not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_acceptance(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
) -> Result<ApiResponse<()>, AppError> {
    principal.require_role(&ROLES)?;
    accessible_request(&state, &principal, id).await?;

    state.store.delete_record(KIND, id).await?;
    record_changed(&state, &principal, id, AuditAction::RecordDeleted(KIND), "Delete penerimaan").await;
    Ok(ApiResponse::message("Penerimaan deleted"))
}

#[derive(OpenApi)]
#[openapi(
    paths(get_acceptance, create_acceptance, update_acceptance, delete_acceptance),
    components(schemas(Acceptance, AcceptanceInput)),
    tags((name = "Penerimaan", description = "Server hand-over records"))
)]
pub struct AcceptanceDoc;
