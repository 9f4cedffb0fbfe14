use axum::{
    extract::State,
    routing::{get, patch},
    Extension, Router,
};
use serde::Deserialize;
use tracing::{info, warn};
use utoipa::{OpenApi, ToSchema};

use crate::api::{accessible_request, UserLookup};
use crate::app_state::AppState;
use crate::db::models::audit::{AuditAction, AuditLogView, NewAuditEntry};
use crate::db::models::request::{
    CreateRequestInput, RequestDetail, RequestListItem, RequestStatus, ServerRequest,
    UpdateRequestInput,
};
use crate::db::models::role::Role;
use crate::error::AppError;
use crate::middleware::auth::Principal;
use crate::utils::api_response::ApiResponse;
use crate::utils::audit;
use crate::utils::validation::{FieldErrors, PathId, Valid, Validate};
use crate::workflow;

pub fn request_routes() -> Router<AppState> {
    Router::new()
        .route("/pengajuan", get(list_requests).post(create_request))
        .route(
            "/pengajuan/{id}",
            get(get_request).patch(update_request).delete(delete_request),
        )
        .route("/pengajuan/{id}/status", patch(override_request_status))
        .route("/pengajuan/{id}/audit", get(list_request_audit))
}

/// Body of `PATCH /pengajuan/{id}/status`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusInput {
    /// One of `DIAJUKAN`, `DIPERIKSA`, `DISETUJUI`, `DITANGGUHKAN`, `DIPROSES`, `DISELESAIKAN`.
    pub status: Option<String>,
}

impl Validate for StatusInput {
    type Output = String;

    fn validate(self) -> Result<String, FieldErrors> {
        let mut errors = FieldErrors::new();
        let status = errors.required_text("status", self.status);
        errors.finish(status)
    }
}

/// Lists requests, newest first
///
/// Requesters only see their own. Every item carries the owner summary and its decisions.
#[utoipa::path(
    get,
    path = "/pengajuan",
    tag = "Pengajuan",
    responses(
        (status = 200, description = "Requests", body = [RequestListItem]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_requests(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<ApiResponse<Vec<RequestListItem>>, AppError> {
    let owner = (principal.role == Role::Requester).then_some(principal.user_id);
    let requests = state.store.list_requests(owner).await?;

    let mut users = UserLookup::new(state.store.as_ref());
    let mut items = Vec::with_capacity(requests.len());
    for request in requests {
        let pemohon = users.summary(request.owner_id).await?;
        let approvals = state.store.list_approvals(Some(request.id)).await?;
        items.push(RequestListItem {
            pemohon,
            persetujuan: users.approvals(approvals).await?,
            request,
        });
    }

    Ok(ApiResponse::ok("Pengajuan retrieved", items))
}

/// Submits a provisioning request
///
/// Contact fields left out are taken from the requester's account. The request starts as
/// `DIAJUKAN`.
#[utoipa::path(
    post,
    path = "/pengajuan",
    tag = "Pengajuan",
    request_body = CreateRequestInput,
    responses(
        (status = 201, description = "Request submitted", body = ServerRequest),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Requesters only")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_request(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Valid(mut payload): Valid<CreateRequestInput>,
) -> Result<ApiResponse<ServerRequest>, AppError> {
    principal.require_role(&[Role::Requester])?;

    let owner = state
        .store
        .find_user(principal.user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized("Unauthorized."))?;
    payload.contact_name.get_or_insert(owner.name);
    payload.contact_email.get_or_insert(owner.email);
    if payload.contact_phone.is_none() {
        payload.contact_phone = owner.phone;
    }

    let request = state.store.create_request(principal.user_id, payload).await?;
    audit::record(
        state.store.as_ref(),
        NewAuditEntry::new(
            request.id,
            principal.user_id,
            AuditAction::RequestCreated,
            format!("Pengajuan {}", request.system_name),
        ),
    )
    .await;

    info!("📝 Pengajuan {} submitted by user {}", request.id, principal.user_id);
    Ok(ApiResponse::created("Pengajuan created", request))
}

/// Full view of one request with every sub-record
#[utoipa::path(
    get,
    path = "/pengajuan/{id}",
    tag = "Pengajuan",
    params(("id" = i32, Path, description = "Pengajuan ID")),
    responses(
        (status = 200, description = "Request detail", body = RequestDetail),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Pengajuan not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_request(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
) -> Result<ApiResponse<RequestDetail>, AppError> {
    let request = accessible_request(&state, &principal, id).await?;
    let store = state.store.as_ref();

    let mut users = UserLookup::new(store);
    let pemohon = users.summary(request.owner_id).await?;
    let persetujuan = users.approvals(store.list_approvals(Some(id)).await?).await?;

    let detail = RequestDetail {
        pemohon,
        persetujuan,
        penerimaan: store.find_acceptance(id).await?,
        monitoring: store.find_monitoring(id).await?,
        backup: store.find_backup(id).await?,
        arsip: store.find_archive(id).await?,
        tindak_lanjut: store.find_follow_up(id).await?,
        konfirmasi: store.find_confirmation(id).await?,
        request,
    };
    Ok(ApiResponse::ok("Pengajuan retrieved", detail))
}

/// Edits a request
///
/// Requesters may edit their own request while it is still `DIAJUKAN`; server admins may edit
/// any request.
#[utoipa::path(
    patch,
    path = "/pengajuan/{id}",
    tag = "Pengajuan",
    params(("id" = i32, Path, description = "Pengajuan ID")),
    request_body = UpdateRequestInput,
    responses(
        (status = 200, description = "Request updated", body = ServerRequest),
        (status = 400, description = "Validation error or empty update"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Pengajuan not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_request(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    Valid(changes): Valid<UpdateRequestInput>,
) -> Result<ApiResponse<ServerRequest>, AppError> {
    principal.require_role(&[Role::Requester, Role::ServerAdmin])?;
    let request = accessible_request(&state, &principal, id).await?;

    if principal.role == Role::Requester && request.status != RequestStatus::Submitted {
        warn!("⛔ User {} tried to edit pengajuan {} in {}", principal.user_id, id, request.status);
        return Err(AppError::forbidden("Pengajuan can no longer be edited."));
    }
    if changes.is_empty() {
        return Err(AppError::bad_request("No fields to update."));
    }

    let updated = state.store.update_request(id, changes).await?;
    audit::record(
        state.store.as_ref(),
        NewAuditEntry::new(id, principal.user_id, AuditAction::RequestUpdated, "Update pengajuan"),
    )
    .await;
    Ok(ApiResponse::ok("Pengajuan updated", updated))
}

/// Deletes a request together with its decisions, sub-records and audit trail
#[utoipa::path(
    delete,
    path = "/pengajuan/{id}",
    tag = "Pengajuan",
    params(("id" = i32, Path, description = "Pengajuan ID")),
    responses(
        (status = 200, description = "Request deleted"),
        (status = 403, description = "Server admin only"),
        (status = 404, description = "Pengajuan not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_request(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
) -> Result<ApiResponse<()>, AppError> {
    principal.require_role(&[Role::ServerAdmin])?;
    state.store.delete_request(id).await?;

    info!("🗑️ Pengajuan {} deleted by user {}", id, principal.user_id);
    Ok(ApiResponse::message("Pengajuan deleted"))
}

/// Sets the status directly, bypassing the approval chain
#[utoipa::path(
    patch,
    path = "/pengajuan/{id}/status",
    tag = "Pengajuan",
    params(("id" = i32, Path, description = "Pengajuan ID")),
    request_body = StatusInput,
    responses(
        (status = 200, description = "Status updated", body = ServerRequest),
        (status = 400, description = "Status outside the allow-list"),
        (status = 403, description = "Approvers only"),
        (status = 404, description = "Pengajuan not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn override_request_status(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    Valid(status): Valid<StatusInput>,
) -> Result<ApiResponse<ServerRequest>, AppError> {
    let updated = workflow::override_status(state.store.as_ref(), &principal, id, &status).await?;
    Ok(ApiResponse::ok("Status updated", updated))
}

/// Audit trail of one request, newest first
#[utoipa::path(
    get,
    path = "/pengajuan/{id}/audit",
    tag = "Pengajuan",
    params(("id" = i32, Path, description = "Pengajuan ID")),
    responses(
        (status = 200, description = "Audit entries", body = [AuditLogView]),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Pengajuan not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_request_audit(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
) -> Result<ApiResponse<Vec<AuditLogView>>, AppError> {
    accessible_request(&state, &principal, id).await?;

    let logs = state.store.list_audit(id).await?;
    let mut users = UserLookup::new(state.store.as_ref());
    let mut views = Vec::with_capacity(logs.len());
    for log in logs {
        let user = match log.user_id {
            Some(user_id) => users.summary(user_id).await?,
            None => None,
        };
        views.push(AuditLogView { log, user });
    }
    Ok(ApiResponse::ok("Audit log retrieved", views))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list_requests,
        create_request,
        get_request,
        update_request,
        delete_request,
        override_request_status,
        list_request_audit
    ),
    components(schemas(
        ServerRequest,
        CreateRequestInput,
        UpdateRequestInput,
        StatusInput,
        RequestListItem,
        RequestDetail,
        AuditLogView
    )),
    tags((name = "Pengajuan", description = "Server provisioning requests"))
)]
pub struct RequestDoc;
