use axum::{
    extract::State,
    routing::get,
    Extension, Router,
};
use utoipa::OpenApi;

use crate::api::{accessible_request, record_changed, record_created};
use crate::app_state::AppState;
use crate::db::models::audit::AuditAction;
use crate::db::models::lifecycle::{Monitoring, MonitoringInput, RecordKind};
use crate::db::models::role::Role;
use crate::error::AppError;
use crate::middleware::auth::Principal;
use crate::utils::api_response::ApiResponse;
use crate::utils::validation::{Patch, PathId, Valid};

const KIND: RecordKind = RecordKind::Monitoring;
const ROLES: [Role; 1] = [Role::ServerAdmin];

pub fn monitoring_routes() -> Router<AppState> {
    Router::new().route(
        "/pengajuan/{id}/monitoring",
        get(get_monitoring)
            .post(create_monitoring)
            .patch(update_monitoring)
            .delete(delete_monitoring),
    )
}

#[utoipa::path(
    get,
    path = "/pengajuan/{id}/monitoring",
    tag = "Monitoring",
    params(("id" = i32, Path, description = "Pengajuan ID")),
    responses(
        (status = 200, description = "Monitoring record", body = Monitoring),
        (status = 404, description = "Pengajuan or monitoring not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_monitoring(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
) -> Result<ApiResponse<Monitoring>, AppError> {
    principal.require_role(&ROLES)?;
    accessible_request(&state, &principal, id).await?;

    let monitoring = state
        .store
        .find_monitoring(id)
        .await?
        .ok_or_else(|| AppError::not_found("Monitoring not found."))?;
    Ok(ApiResponse::ok("Monitoring retrieved", monitoring))
}

#[utoipa::path(
    post,
    path = "/pengajuan/{id}/monitoring",
    tag = "Monitoring",
    params(("id" = i32, Path, description = "Pengajuan ID")),
    request_body = MonitoringInput,
    responses(
        (status = 201, description = "Monitoring created", body = Monitoring),
        (status = 400, description = "No monitoring field given"),
        (status = 404, description = "Pengajuan not found"),
        (status = 409, description = "Monitoring already exists")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_monitoring(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    Valid(payload): Valid<MonitoringInput>,
) -> Result<ApiResponse<Monitoring>, AppError> {
    principal.require_role(&ROLES)?;
    accessible_request(&state, &principal, id).await?;

    let monitoring = state.store.create_monitoring(id, payload).await?;
    let detail = format!(
        "IP: {} | Host: {} | Status: {}",
        monitoring.ip_address.as_deref().unwrap_or("-"),
        monitoring.host.as_deref().unwrap_or("-"),
        monitoring.state.as_deref().unwrap_or("-"),
    );
    record_created(&state, &principal, KIND, id, detail).await?;
    Ok(ApiResponse::created("Monitoring created", monitoring))
}

#[utoipa::path(
    patch,
    path = "/pengajuan/{id}/monitoring",
    tag = "Monitoring",
    params(("id" = i32, Path, description = "Pengajuan ID")),
    request_body = MonitoringInput,
    responses(
        (status = 200, description = "Monitoring updated", body = Monitoring),
        (status = 400, description = "Empty update"),
        (status = 404, description = "Monitoring not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_monitoring(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    Valid(changes): Valid<Patch<MonitoringInput>>,
) -> Result<ApiResponse<Monitoring>, AppError> {
    principal.require_role(&ROLES)?;
    accessible_request(&state, &principal, id).await?;

    let monitoring = state.store.update_monitoring(id, changes).await?;
    record_changed(&state, &principal, id, AuditAction::RecordUpdated(KIND), "Update monitoring").await;
    Ok(ApiResponse::ok("Monitoring updated", monitoring))
}

#[utoipa::path(
    delete,
    path = "/pengajuan/{id}/monitoring",
    tag = "Monitoring",
    params(("id" = i32, Path, description = "Pengajuan ID")),
    responses(
        (status = 200, description = "Monitoring deleted"),
        (status = 404, description = "Monitoring not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_monitoring(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
) -> Result<ApiResponse<()>, AppError> {
    principal.require_role(&ROLES)?;
    accessible_request(&state, &principal, id).await?;

    state.store.delete_record(KIND, id).await?;
    record_changed(&state, &principal, id, AuditAction::RecordDeleted(KIND), "Delete monitoring").await;
    Ok(ApiResponse::message("Monitoring deleted"))
}

#[derive(OpenApi)]
#[openapi(
    paths(get_monitoring, create_monitoring, update_monitoring, delete_monitoring),
    components(schemas(Monitoring, MonitoringInput)),
    tags((name = "Monitoring", description = "Runtime monitoring of provisioned servers"))
)]
pub struct MonitoringDoc;
