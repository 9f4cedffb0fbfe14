use async_trait::async_trait;
use thiserror::Error;

use crate::db::models::approval::{Approval, NewApproval};
use crate::db::models::audit::{AuditLog, NewAuditEntry};
use crate::db::models::lifecycle::{
    Acceptance, AcceptanceChanges, Archive, ArchiveNote, Backup, BackupChanges, Confirmation,
    ConfirmationFields, FollowUp, FollowUpChanges, Monitoring, MonitoringFields, NewAcceptance,
    NewBackup, NewFollowUp, RecordKind,
};
use crate::db::models::request::{NewServerRequest, RequestChanges, RequestStatus, ServerRequest};
use crate::db::models::role::Role;
use crate::db::models::user::{NewUser, User, UserChanges};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn duplicate_email() -> Self {
        StoreError::Conflict("Email already registered.".to_string())
    }

    pub fn duplicate_decision() -> Self {
        StoreError::Conflict("This role has already decided on the request.".to_string())
    }

    pub fn duplicate_record(kind: RecordKind) -> Self {
        StoreError::Conflict(format!("{} already exists for this request.", kind.label()))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Maps the request's current status to the one it moves to after a decision.
pub type Transition<'a> = &'a (dyn Fn(RequestStatus) -> RequestStatus + Send + Sync);

/// A stored decision with the request status it was applied to.
#[derive(Debug, Clone)]
pub struct RecordedDecision {
    pub approval: Approval,
    pub previous_status: RequestStatus,
    pub request: ServerRequest,
}

/// Persistence seam between the HTTP layer and the database.
///
/// Listings are newest first. Deleting a request removes its approvals, sub-records and audit rows.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;

    // users
    async fn find_user(&self, id: i32) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn list_users(&self, role: Option<Role>) -> StoreResult<Vec<User>>;
    /// `Conflict` on a duplicate email.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    async fn update_user(&self, id: i32, changes: UserChanges) -> StoreResult<User>;
    async fn delete_user(&self, id: i32) -> StoreResult<()>;

    // requests
    async fn create_request(&self, owner_id: i32, request: NewServerRequest) -> StoreResult<ServerRequest>;
    async fn find_request(&self, id: i32) -> StoreResult<Option<ServerRequest>>;
    async fn list_requests(&self, owner_id: Option<i32>) -> StoreResult<Vec<ServerRequest>>;
    async fn update_request(&self, id: i32, changes: RequestChanges) -> StoreResult<ServerRequest>;
    async fn set_request_status(&self, id: i32, status: RequestStatus) -> StoreResult<ServerRequest>;
    async fn delete_request(&self, id: i32) -> StoreResult<()>;

    // approvals
    async fn list_approvals(&self, request_id: Option<i32>) -> StoreResult<Vec<Approval>>;
    async fn find_approval_by_role(&self, request_id: i32, role: Role) -> StoreResult<Option<Approval>>;
    /// Inserts the approval, applies `transition` to the status read inside the same unit and
    /// appends the audit entry. `Conflict` when the request already holds a decision from
    /// `approval.decider_role`.
    async fn record_decision(
        &self,
        approval: NewApproval,
        transition: Transition<'_>,
        audit: NewAuditEntry,
    ) -> StoreResult<RecordedDecision>;
    async fn delete_approval(&self, id: i32) -> StoreResult<Approval>;

    // lifecycle sub-records, keyed by request id
    async fn find_acceptance(&self, request_id: i32) -> StoreResult<Option<Acceptance>>;
    async fn create_acceptance(&self, request_id: i32, record: NewAcceptance) -> StoreResult<Acceptance>;
    async fn update_acceptance(&self, request_id: i32, changes: AcceptanceChanges) -> StoreResult<Acceptance>;

    async fn find_monitoring(&self, request_id: i32) -> StoreResult<Option<Monitoring>>;
    async fn create_monitoring(&self, request_id: i32, record: MonitoringFields) -> StoreResult<Monitoring>;
    async fn update_monitoring(&self, request_id: i32, changes: MonitoringFields) -> StoreResult<Monitoring>;

    async fn find_backup(&self, request_id: i32) -> StoreResult<Option<Backup>>;
    async fn create_backup(&self, request_id: i32, record: NewBackup) -> StoreResult<Backup>;
    async fn update_backup(&self, request_id: i32, changes: BackupChanges) -> StoreResult<Backup>;

    async fn find_archive(&self, request_id: i32) -> StoreResult<Option<Archive>>;
    async fn create_archive(&self, request_id: i32, record: ArchiveNote) -> StoreResult<Archive>;
    async fn update_archive(&self, request_id: i32, changes: ArchiveNote) -> StoreResult<Archive>;

    async fn find_follow_up(&self, request_id: i32) -> StoreResult<Option<FollowUp>>;
    async fn create_follow_up(&self, request_id: i32, record: NewFollowUp) -> StoreResult<FollowUp>;
    async fn update_follow_up(&self, request_id: i32, changes: FollowUpChanges) -> StoreResult<FollowUp>;

    async fn find_confirmation(&self, request_id: i32) -> StoreResult<Option<Confirmation>>;
    async fn create_confirmation(
        &self,
        request_id: i32,
        user_id: i32,
        record: ConfirmationFields,
    ) -> StoreResult<Confirmation>;
    async fn update_confirmation(&self, request_id: i32, changes: ConfirmationFields) -> StoreResult<Confirmation>;

    /// `NotFound` when the request has no record of that kind.
    async fn delete_record(&self, kind: RecordKind, request_id: i32) -> StoreResult<()>;

    // audit trail
    async fn append_audit(&self, entry: NewAuditEntry) -> StoreResult<AuditLog>;
    async fn list_audit(&self, request_id: i32) -> StoreResult<Vec<AuditLog>>;
}

