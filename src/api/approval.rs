use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::api::{record_changed, UserLookup};
use crate::app_state::AppState;
use crate::db::models::approval::{Approval, ApprovalView, DecisionInput};
use crate::db::models::audit::AuditAction;
use crate::db::models::request::RequestStatus;
use crate::db::models::role::Role;
use crate::error::AppError;
use crate::middleware::auth::Principal;
use crate::utils::api_response::ApiResponse;
use crate::utils::validation::{FieldErrors, Valid};
use crate::workflow::{self, DecisionOutcome};

pub fn approval_routes() -> Router<AppState> {
    Router::new().route(
        "/persetujuan",
        get(list_approvals).post(submit_approval).delete(delete_approval),
    )
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ApprovalFilter {
    /// Only decisions on this request.
    #[serde(rename = "pengajuanId")]
    pub pengajuan_id: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ApprovalTarget {
    pub id: Option<String>,
}

/// Result of a decision: the stored row and where the request moved.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecisionResult {
    pub persetujuan: Approval,
    pub status_sebelumnya: RequestStatus,
    pub status: RequestStatus,
}

impl From<DecisionOutcome> for DecisionResult {
    fn from(outcome: DecisionOutcome) -> Self {
        Self {
            status: outcome.request.status,
            status_sebelumnya: outcome.previous_status,
            persetujuan: outcome.approval,
        }
    }
}

/// Query-string ids go through the same field validation as bodies.
fn query_id(field: &str, raw: Option<String>, required: bool) -> Result<Option<i32>, AppError> {
    let mut errors = FieldErrors::new();
    let id = match raw.as_deref().map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => match raw.parse::<i32>() {
            Ok(id) if id > 0 => Some(id),
            _ => {
                errors.push(field, "Must be a positive integer");
                None
            }
        },
        None => {
            if required {
                errors.push(field, "Required");
            }
            None
        }
    };
    Ok(errors.finish(id)?)
}

/// Lists decisions, newest first
#[utoipa::path(
    get,
    path = "/persetujuan",
    tag = "Persetujuan",
    params(ApprovalFilter),
    responses(
        (status = 200, description = "Decisions", body = [ApprovalView]),
        (status = 403, description = "Approvers only")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_approvals(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(filter): Query<ApprovalFilter>,
) -> Result<ApiResponse<Vec<ApprovalView>>, AppError> {
    principal.require_role(&Role::APPROVERS)?;
    let request_id = query_id("pengajuanId", filter.pengajuan_id, false)?;

    let approvals = state.store.list_approvals(request_id).await?;
    let views = UserLookup::new(state.store.as_ref()).approvals(approvals).await?;
    Ok(ApiResponse::ok("Persetujuan retrieved", views))
}

/// Records the caller's decision on a request
///
/// Each approver role decides once per request. An approval advances the request along
/// the chain (`KEPALA_LAB` → `DIPERIKSA`, `WADEK` → `DISETUJUI`, `DEKAN` → `DIPROSES`);
/// a rejection by any approver sets `DITOLAK`.
#[utoipa::path(
    post,
    path = "/persetujuan",
    tag = "Persetujuan",
    request_body = DecisionInput,
    responses(
        (status = 201, description = "Decision recorded", body = DecisionResult),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Approvers only"),
        (status = 404, description = "Pengajuan not found"),
        (status = 409, description = "Role already decided on this request")
    ),
    security(("bearerAuth" = []))
)]
pub async fn submit_approval(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Valid(decision): Valid<DecisionInput>,
) -> Result<ApiResponse<DecisionResult>, AppError> {
    let outcome = workflow::submit_decision(state.store.as_ref(), &principal, decision).await?;
    Ok(ApiResponse::created("Persetujuan recorded", outcome.into()))
}

/// Removes one decision; the request status is left as is
#[utoipa::path(
    delete,
    path = "/persetujuan",
    tag = "Persetujuan",
    params(ApprovalTarget),
    responses(
        (status = 200, description = "Decision deleted", body = Approval),
        (status = 403, description = "Server admin only"),
        (status = 404, description = "Persetujuan not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_approval(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(target): Query<ApprovalTarget>,
) -> Result<ApiResponse<Approval>, AppError> {
    principal.require_role(&[Role::ServerAdmin])?;
    let Some(id) = query_id("id", target.id, true)? else {
        return Err(AppError::bad_request("id is required."));
    };

    let approval = state.store.delete_approval(id).await?;
    record_changed(
        &state,
        &principal,
        approval.request_id,
        AuditAction::DecisionDeleted,
        format!("Delete persetujuan {} ({})", approval.id, approval.decider_role),
    )
    .await;

    info!("🗑️ Persetujuan {} removed by user {}", id, principal.user_id);
    Ok(ApiResponse::ok("Persetujuan deleted", approval))
}

#[derive(OpenApi)]
#[openapi(
    paths(list_approvals, submit_approval, delete_approval),
    components(schemas(Approval, ApprovalView, DecisionInput, DecisionResult)),
    tags((name = "Persetujuan", description = "Approval chain decisions"))
)]
pub struct ApprovalDoc;
