use tracing::{info, warn};

use crate::db::models::approval::{Approval, DecisionRequest, NewApproval};
use crate::db::models::audit::{AuditAction, NewAuditEntry};
use crate::db::models::request::{RequestStatus, ServerRequest};
use crate::db::store::{RecordStore, StoreError};
use crate::middleware::auth::Principal;
use crate::utils::audit;
use crate::workflow::transition::{next_status, parse_override_status};
use crate::workflow::WorkflowError;

#[derive(Debug, Clone)]
pub struct DecisionOutcome {
    pub approval: Approval,
    pub request: ServerRequest,
    pub previous_status: RequestStatus,
}

/// Records `decider`'s decision on a request and moves the request to its next status.
///
/// Each role decides at most once per request. The approval row, the status change and the
/// `PERSETUJUAN` audit entry are written together.
pub async fn submit_decision(
    store: &dyn RecordStore,
    decider: &Principal,
    decision: DecisionRequest,
) -> Result<DecisionOutcome, WorkflowError> {
    if !decider.role.is_approver() {
        return Err(WorkflowError::RoleNotAllowed(decider.role));
    }

    let request_id = decision.request_id;
    if store.find_request(request_id).await?.is_none() {
        return Err(WorkflowError::RequestNotFound(request_id));
    }

    let duplicate = WorkflowError::DuplicateDecision {
        request_id,
        role: decider.role,
    };
    if store.find_approval_by_role(request_id, decider.role).await?.is_some() {
        warn!("⚠️ {} already decided on pengajuan {}", decider.role, request_id);
        return Err(duplicate);
    }

    let (role, verdict) = (decider.role, decision.decision);
    let transition = move |current: RequestStatus| next_status(current, role, verdict);
    let detail = format!(
        "Role: {} | Status: {} | Note: {}",
        decider.role,
        decision.decision,
        decision.note.as_deref().unwrap_or("-")
    );

    let recorded = store
        .record_decision(
            NewApproval {
                request_id,
                user_id: decider.user_id,
                decider_role: decider.role,
                decision: decision.decision,
                note: decision.note,
            },
            &transition,
            NewAuditEntry::new(request_id, decider.user_id, AuditAction::Decision, detail),
        )
        .await
        .map_err(|e| match e {
            // Lost the race against a concurrent decision from the same role.
            StoreError::Conflict(_) => duplicate,
            StoreError::NotFound(_) => WorkflowError::RequestNotFound(request_id),
            other => WorkflowError::Store(other),
        })?;

    info!(
        "✅ {} {} pengajuan {}: {} -> {}",
        decider.role,
        recorded.approval.decision,
        request_id,
        recorded.previous_status,
        recorded.request.status
    );

    Ok(DecisionOutcome {
        approval: recorded.approval,
        request: recorded.request,
        previous_status: recorded.previous_status,
    })
}

/// Sets a request's status directly to one of the override statuses, from any current status.
pub async fn override_status(
    store: &dyn RecordStore,
    actor: &Principal,
    request_id: i32,
    raw_status: &str,
) -> Result<ServerRequest, WorkflowError> {
    if !actor.role.is_approver() {
        return Err(WorkflowError::RoleNotAllowed(actor.role));
    }
    let status = parse_override_status(raw_status)?;

    let updated = store
        .set_request_status(request_id, status)
        .await
        .map_err(|e| match e {
            StoreError::NotFound(_) => WorkflowError::RequestNotFound(request_id),
            other => WorkflowError::Store(other),
        })?;

    audit::record(
        store,
        NewAuditEntry::new(
            request_id,
            actor.user_id,
            AuditAction::StatusOverride,
            format!("Status -> {}", status),
        ),
    )
    .await;

    info!("🔧 {} set pengajuan {} to {}", actor.role, request_id, status);
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::InMemoryStore;
    use crate::db::models::approval::Decision;
    use crate::db::models::request::NewServerRequest;
    use crate::db::models::role::Role;
    use crate::db::models::user::NewUser;

    async fn principal(store: &InMemoryStore, role: Role) -> Principal {
        let user = store
            .create_user(NewUser {
                name: format!("{role}"),
                email: format!("{}@demo.com", role.as_str().to_lowercase()),
                password_hash: "hash".into(),
                phone: None,
                role,
            })
            .await
            .unwrap();
        Principal::from(&user)
    }

    async fn submitted_request(store: &InMemoryStore, owner: &Principal) -> ServerRequest {
        store
            .create_request(
                owner.user_id,
                NewServerRequest {
                    system_name: "E-Learning".into(),
                    cpu_cores: 4,
                    ram_gb: 8,
                    storage_gb: 100,
                    operating_system: "Ubuntu".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
    }

    fn decide(request: &ServerRequest, decision: Decision, note: Option<&str>) -> DecisionRequest {
        DecisionRequest {
            request_id: request.id,
            decision,
            note: note.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn chain_ends_in_rejection_by_the_dean() {
        let store = InMemoryStore::new();
        let owner = principal(&store, Role::Requester).await;
        let lab_head = principal(&store, Role::LabHead).await;
        let vice_dean = principal(&store, Role::ViceDean).await;
        let dean = principal(&store, Role::Dean).await;
        let request = submitted_request(&store, &owner).await;

        let outcome = submit_decision(&store, &lab_head, decide(&request, Decision::Approved, Some("ok")))
            .await
            .unwrap();
        assert_eq!(outcome.previous_status, RequestStatus::Submitted);
        assert_eq!(outcome.request.status, RequestStatus::UnderReview);

        let outcome = submit_decision(&store, &vice_dean, decide(&request, Decision::Approved, None))
            .await
            .unwrap();
        assert_eq!(outcome.request.status, RequestStatus::ApprovedStage1);

        let outcome = submit_decision(
            &store,
            &dean,
            decide(&request, Decision::Rejected, Some("insufficient budget")),
        )
        .await
        .unwrap();
        assert_eq!(outcome.request.status, RequestStatus::Rejected);
        assert_eq!(store.list_approvals(Some(request.id)).await.unwrap().len(), 3);

        let audit = store.list_audit(request.id).await.unwrap();
        assert_eq!(audit.len(), 3);
        assert!(audit.iter().all(|log| log.action == "PERSETUJUAN"));
        assert_eq!(
            audit[0].detail.as_deref(),
            Some("Role: DEKAN | Status: DITOLAK | Note: insufficient budget")
        );
    }

    #[tokio::test]
    async fn same_role_cannot_decide_twice_even_as_another_user() {
        let store = InMemoryStore::new();
        let owner = principal(&store, Role::Requester).await;
        let lab_head = principal(&store, Role::LabHead).await;
        let other_lab_head = Principal {
            user_id: lab_head.user_id + 100,
            ..lab_head.clone()
        };
        let request = submitted_request(&store, &owner).await;

        submit_decision(&store, &lab_head, decide(&request, Decision::Approved, None))
            .await
            .unwrap();
        let err = submit_decision(&store, &other_lab_head, decide(&request, Decision::Rejected, None))
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::DuplicateDecision { role: Role::LabHead, .. }));
        let current = store.find_request(request.id).await.unwrap().unwrap();
        assert_eq!(current.status, RequestStatus::UnderReview);
        assert_eq!(store.list_approvals(Some(request.id)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn non_approvers_and_missing_requests_are_refused() {
        let store = InMemoryStore::new();
        let owner = principal(&store, Role::Requester).await;
        let dean = principal(&store, Role::Dean).await;
        let request = submitted_request(&store, &owner).await;

        let err = submit_decision(&store, &owner, decide(&request, Decision::Approved, None))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::RoleNotAllowed(Role::Requester)));

        let missing = DecisionRequest {
            request_id: request.id + 1,
            decision: Decision::Approved,
            note: None,
        };
        let err = submit_decision(&store, &dean, missing).await.unwrap_err();
        assert!(matches!(err, WorkflowError::RequestNotFound(_)));
        assert!(store.list_approvals(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn server_admin_approval_keeps_status() {
        let store = InMemoryStore::new();
        let owner = principal(&store, Role::Requester).await;
        let admin = principal(&store, Role::ServerAdmin).await;
        let request = submitted_request(&store, &owner).await;

        let outcome = submit_decision(&store, &admin, decide(&request, Decision::Approved, None))
            .await
            .unwrap();
        assert_eq!(outcome.request.status, RequestStatus::Submitted);
        assert_eq!(store.list_audit(request.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn override_skips_transition_checks_and_audits() {
        let store = InMemoryStore::new();
        let owner = principal(&store, Role::Requester).await;
        let admin = principal(&store, Role::ServerAdmin).await;
        let request = submitted_request(&store, &owner).await;

        let updated = override_status(&store, &admin, request.id, "DISELESAIKAN").await.unwrap();
        assert_eq!(updated.status, RequestStatus::Fulfilled);

        let audit = store.list_audit(request.id).await.unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].action, "STATUS_UPDATE");
        assert_eq!(audit[0].detail.as_deref(), Some("Status -> DISELESAIKAN"));

        let err = override_status(&store, &admin, request.id, "DITOLAK").await.unwrap_err();
        assert!(matches!(err, WorkflowError::StatusNotAllowed(_)));
        let err = override_status(&store, &owner, request.id, "DIPROSES").await.unwrap_err();
        assert!(matches!(err, WorkflowError::RoleNotAllowed(_)));
        let err = override_status(&store, &admin, 999, "DIPROSES").await.unwrap_err();
        assert!(matches!(err, WorkflowError::RequestNotFound(999)));
    }
}
