pub mod acceptance;
pub mod approval;
pub mod archive;
pub mod auth;
pub mod backup;
pub mod confirmation;
pub mod follow_up;
pub mod health;
pub mod monitoring;
pub mod requests;
pub mod user;

use std::collections::HashMap;

use axum::{middleware::from_fn_with_state, Router};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer, trace::TraceLayer,
};
use tracing::info;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;
use utoipa_swagger_ui::SwaggerUi;

use crate::app_state::AppState;
use crate::db::models::approval::{Approval, ApprovalView};
use crate::db::models::audit::{AuditAction, NewAuditEntry};
use crate::db::models::lifecycle::RecordKind;
use crate::db::models::request::ServerRequest;
use crate::db::models::user::UserSummary;
use crate::db::store::RecordStore;
use crate::error::AppError;
use crate::middleware::auth::{auth_middleware, Principal};
use crate::utils::audit;
use crate::workflow::transition::status_after_create;

const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Merged OpenAPI document for every route group.
pub fn openapi() -> utoipa::openapi::OpenApi {
    auth::AuthDoc::openapi()
        .merge_from(health::HealthDoc::openapi())
        .merge_from(user::UserDoc::openapi())
        .merge_from(requests::RequestDoc::openapi())
        .merge_from(approval::ApprovalDoc::openapi())
        .merge_from(acceptance::AcceptanceDoc::openapi())
        .merge_from(monitoring::MonitoringDoc::openapi())
        .merge_from(backup::BackupDoc::openapi())
        .merge_from(archive::ArchiveDoc::openapi())
        .merge_from(follow_up::FollowUpDoc::openapi())
        .merge_from(confirmation::ConfirmationDoc::openapi())
}

/// Builds the full application router.
pub fn app(state: AppState) -> Router {
    let merged_doc = openapi();

    // Public routes
    let public_routes = Router::new()
        .merge(health::health_routes())
        .merge(auth::auth_routes());

    // Private routes
    let private_routes = Router::new()
        .merge(auth::secure_auth_routes())
        .merge(user::user_routes())
        .merge(requests::request_routes())
        .merge(approval::approval_routes())
        .merge(acceptance::acceptance_routes())
        .merge(monitoring::monitoring_routes())
        .merge(backup::backup_routes())
        .merge(archive::archive_routes())
        .merge(follow_up::follow_up_routes())
        .merge(confirmation::confirmation_routes())
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let timeout = state.config.request_timeout;
    info!("🧭 Routes ready, request timeout {:?}", timeout);

    Router::new()
        .merge(public_routes)
        .merge(private_routes)
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", merged_doc.clone()))
        .merge(RapiDoc::with_openapi("/api-docs/rapidoc.json", merged_doc).path("/rapidoc"))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(TimeoutLayer::new(timeout))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Loads a request and applies the ownership guard.
pub(crate) async fn accessible_request(
    state: &AppState,
    principal: &Principal,
    request_id: i32,
) -> Result<ServerRequest, AppError> {
    let request = state
        .store
        .find_request(request_id)
        .await?
        .ok_or_else(|| AppError::not_found("Pengajuan not found."))?;
    principal.ensure_access(&request)?;
    Ok(request)
}

/// Resolves user summaries, hitting the store once per distinct user.
pub(crate) struct UserLookup<'a> {
    store: &'a dyn RecordStore,
    seen: HashMap<i32, Option<UserSummary>>,
}

impl<'a> UserLookup<'a> {
    pub(crate) fn new(store: &'a dyn RecordStore) -> Self {
        Self {
            store,
            seen: HashMap::new(),
        }
    }

    pub(crate) async fn summary(&mut self, user_id: i32) -> Result<Option<UserSummary>, AppError> {
        if let Some(known) = self.seen.get(&user_id) {
            return Ok(known.clone());
        }
        let summary = self
            .store
            .find_user(user_id)
            .await?
            .as_ref()
            .map(UserSummary::from);
        self.seen.insert(user_id, summary.clone());
        Ok(summary)
    }

    pub(crate) async fn approvals(
        &mut self,
        approvals: Vec<Approval>,
    ) -> Result<Vec<ApprovalView>, AppError> {
        let mut views = Vec::with_capacity(approvals.len());
        for approval in approvals {
            let user = self.summary(approval.user_id).await?;
            views.push(ApprovalView { approval, user });
        }
        Ok(views)
    }
}

/// Applies the status change tied to creating a `kind` record, then audits the creation.
pub(crate) async fn record_created(
    state: &AppState,
    principal: &Principal,
    kind: RecordKind,
    request_id: i32,
    detail: String,
) -> Result<(), AppError> {
    if let Some(status) = status_after_create(kind) {
        state.store.set_request_status(request_id, status).await?;
        info!("🔄 Pengajuan {} moved to {} after {}", request_id, status, kind.label());
    }
    audit::record(
        state.store.as_ref(),
        NewAuditEntry::new(request_id, principal.user_id, AuditAction::RecordCreated(kind), detail),
    )
    .await;
    Ok(())
}

pub(crate) async fn record_changed(
    state: &AppState,
    principal: &Principal,
    request_id: i32,
    action: AuditAction,
    detail: impl Into<String>,
) {
    audit::record(
        state.store.as_ref(),
        NewAuditEntry::new(request_id, principal.user_id, action, detail),
    )
    .await;
}
