use axum::{
    extract::State,
    routing::get,
    Extension, Router,
};
use tracing::{info, warn};
use utoipa::OpenApi;

use crate::api::{accessible_request, record_changed, record_created};
use crate::app_state::AppState;
use crate::db::models::audit::AuditAction;
use crate::db::models::lifecycle::{Confirmation, ConfirmationInput, RecordKind};
use crate::db::models::role::Role;
use crate::error::AppError;
use crate::middleware::auth::Principal;
use crate::utils::api_response::ApiResponse;
use crate::utils::validation::{Patch, PathId, Valid};
use crate::workflow::transition::can_confirm;

const KIND: RecordKind = RecordKind::Confirmation;
const ROLES: [Role; 1] = [Role::Requester];

pub fn confirmation_routes() -> Router<AppState> {
    Router::new().route(
        "/pengajuan/{id}/konfirmasi",
        get(get_confirmation)
            .post(create_confirmation)
            .patch(update_confirmation)
            .delete(delete_confirmation),
    )
}

fn describe(confirmation: &Confirmation) -> String {
    match &confirmation.note {
        Some(note) => format!("Status: {} | Catatan: {}", confirmation.state, note),
        None => format!("Status: {}", confirmation.state),
    }
}

#[utoipa::path(
    get,
    path = "/pengajuan/{id}/konfirmasi",
    tag = "Konfirmasi",
    params(("id" = i32, Path, description = "Pengajuan ID")),
    responses(
        (status = 200, description = "Confirmation record", body = Confirmation),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Pengajuan or confirmation not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_confirmation(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
) -> Result<ApiResponse<Confirmation>, AppError> {
    principal.require_role(&ROLES)?;
    accessible_request(&state, &principal, id).await?;

    let confirmation = state
        .store
        .find_confirmation(id)
        .await?
        .ok_or_else(|| AppError::not_found("Konfirmasi not found."))?;
    Ok(ApiResponse::ok("Konfirmasi retrieved", confirmation))
}

/// The requester confirms receipt of a handed-over server (`DISELESAIKAN` → `DITERIMA`).
#[utoipa::path(
    post,
    path = "/pengajuan/{id}/konfirmasi",
    tag = "Konfirmasi",
    params(("id" = i32, Path, description = "Pengajuan ID")),
    request_body = ConfirmationInput,
    responses(
        (status = 201, description = "Confirmation created", body = Confirmation),
        (status = 400, description = "Validation error or request not yet handed over"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Pengajuan not found"),
        (status = 409, description = "Confirmation already exists")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_confirmation(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    Valid(payload): Valid<ConfirmationInput>,
) -> Result<ApiResponse<Confirmation>, AppError> {
    principal.require_role(&ROLES)?;
    let request = accessible_request(&state, &principal, id).await?;

    if !can_confirm(request.status) {
        warn!("⚠️ Pengajuan {} confirmed while {}", id, request.status);
        return Err(AppError::bad_request("Pengajuan belum diserahkan."));
    }

    let confirmation = state
        .store
        .create_confirmation(id, principal.user_id, payload)
        .await?;
    record_created(&state, &principal, KIND, id, describe(&confirmation)).await?;

    info!("🤝 Pengajuan {} confirmed by user {}", id, principal.user_id);
    Ok(ApiResponse::created("Konfirmasi created", confirmation))
}

#[utoipa::path(
    patch,
    path = "/pengajuan/{id}/konfirmasi",
    tag = "Konfirmasi",
    params(("id" = i32, Path, description = "Pengajuan ID")),
    request_body = ConfirmationInput,
    responses(
        (status = 200, description = "Confirmation updated", body = Confirmation),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Confirmation not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_confirmation(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    Valid(changes): Valid<Patch<ConfirmationInput>>,
) -> Result<ApiResponse<Confirmation>, AppError> {
    principal.require_role(&ROLES)?;
    accessible_request(&state, &principal, id).await?;

    let confirmation = state.store.update_confirmation(id, changes).await?;
    record_changed(&state, &principal, id, AuditAction::RecordUpdated(KIND), describe(&confirmation)).await;
    Ok(ApiResponse::ok("Konfirmasi updated", confirmation))
}

#[utoipa::path(
    delete,
    path = "/pengajuan/{id}/konfirmasi",
    tag = "Konfirmasi",
    params(("id" = i32, Path, description = "Pengajuan ID")),
    responses(
        (status = 200, description = "Confirmation deleted"),
        (status = 404, description = "Confirmation not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_confirmation(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
) -> Result<ApiResponse<()>, AppError> {
    principal.require_role(&ROLES)?;
    accessible_request(&state, &principal, id).await?;

    state.store.delete_record(KIND, id).await?;
    record_changed(&state, &principal, id, AuditAction::RecordDeleted(KIND), "Delete konfirmasi").await;
    Ok(ApiResponse::message("Konfirmasi deleted"))
}

#[derive(OpenApi)]
#[openapi(
    paths(get_confirmation, create_confirmation, update_confirmation, delete_confirmation),
    components(schemas(Confirmation, ConfirmationInput)),
    tags((name = "Konfirmasi", description = "Requester confirmation of a delivered server"))
)]
pub struct ConfirmationDoc;
