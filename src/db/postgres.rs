use async_trait::async_trait;
use sqlx::PgPool;

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
use crate::db::queries;
use crate::db::store::{RecordStore, RecordedDecision, StoreError, StoreResult, Transition};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Maps constraint violations onto store errors; everything else stays a database error.
fn classify(err: sqlx::Error, on_unique: impl FnOnce() -> StoreError, missing: &'static str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some(UNIQUE_VIOLATION) => return on_unique(),
            Some(FOREIGN_KEY_VIOLATION) => return StoreError::NotFound(missing),
            _ => {}
        }
    }
    StoreError::Database(err)
}

/// `RecordStore` backed by PostgreSQL.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_user(&self, id: i32) -> StoreResult<Option<User>> {
        Ok(queries::user::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(queries::user::find_by_email(&self.pool, email).await?)
    }

    async fn list_users(&self, role: Option<Role>) -> StoreResult<Vec<User>> {
        Ok(queries::user::list(&self.pool, role).await?)
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        queries::user::insert(&self.pool, &user)
            .await
            .map_err(|e| classify(e, StoreError::duplicate_email, "User"))
    }

    async fn update_user(&self, id: i32, changes: UserChanges) -> StoreResult<User> {
        queries::user::update(&self.pool, id, &changes)
            .await
            .map_err(|e| classify(e, StoreError::duplicate_email, "User"))?
            .ok_or(StoreError::NotFound("User"))
    }

    async fn delete_user(&self, id: i32) -> StoreResult<()> {
        if queries::user::delete(&self.pool, id).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound("User"))
        }
    }

    async fn create_request(&self, owner_id: i32, request: NewServerRequest) -> StoreResult<ServerRequest> {
        queries::request::insert(&self.pool, owner_id, &request)
            .await
            .map_err(|e| classify(e, || StoreError::Conflict("Duplicate request.".into()), "User"))
    }

    async fn find_request(&self, id: i32) -> StoreResult<Option<ServerRequest>> {
        Ok(queries::request::find_by_id(&self.pool, id).await?)
    }

    async fn list_requests(&self, owner_id: Option<i32>) -> StoreResult<Vec<ServerRequest>> {
        Ok(queries::request::list(&self.pool, owner_id).await?)
    }

    async fn update_request(&self, id: i32, changes: RequestChanges) -> StoreResult<ServerRequest> {
        queries::request::update(&self.pool, id, &changes)
            .await?
            .ok_or(StoreError::NotFound("Pengajuan"))
    }

    async fn set_request_status(&self, id: i32, status: RequestStatus) -> StoreResult<ServerRequest> {
        queries::request::set_status(&self.pool, id, status)
            .await?
            .ok_or(StoreError::NotFound("Pengajuan"))
    }

    async fn delete_request(&self, id: i32) -> StoreResult<()> {
        if queries::request::delete(&self.pool, id).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound("Pengajuan"))
        }
    }

    async fn list_approvals(&self, request_id: Option<i32>) -> StoreResult<Vec<Approval>> {
        Ok(queries::approval::list(&self.pool, request_id).await?)
    }

    async fn find_approval_by_role(&self, request_id: i32, role: Role) -> StoreResult<Option<Approval>> {
        Ok(queries::approval::find_by_role(&self.pool, request_id, role).await?)
    }

    async fn record_decision(
        &self,
        approval: NewApproval,
        transition: Transition<'_>,
        audit: NewAuditEntry,
    ) -> StoreResult<RecordedDecision> {
        let mut tx = self.pool.begin().await?;

        // Row lock: a concurrent decision waits and then sees this one's status.
        let previous_status = queries::request::lock_status(&mut *tx, approval.request_id)
            .await?
            .ok_or(StoreError::NotFound("Pengajuan"))?;
        let approval = queries::approval::insert(&mut *tx, &approval)
            .await
            .map_err(|e| classify(e, StoreError::duplicate_decision, "Pengajuan"))?;
        let request = queries::request::set_status(&mut *tx, approval.request_id, transition(previous_status))
            .await?
            .ok_or(StoreError::NotFound("Pengajuan"))?;
        queries::audit::insert(&mut *tx, &audit).await?;

        tx.commit().await?;
        Ok(RecordedDecision {
            approval,
            previous_status,
            request,
        })
    }

    async fn delete_approval(&self, id: i32) -> StoreResult<Approval> {
        queries::approval::delete(&self.pool, id)
            .await?
            .ok_or(StoreError::NotFound("Persetujuan"))
    }

    async fn find_acceptance(&self, request_id: i32) -> StoreResult<Option<Acceptance>> {
        Ok(queries::lifecycle::find_acceptance(&self.pool, request_id).await?)
    }

    async fn create_acceptance(&self, request_id: i32, record: NewAcceptance) -> StoreResult<Acceptance> {
        queries::lifecycle::insert_acceptance(&self.pool, request_id, &record)
            .await
            .map_err(|e| classify(e, || StoreError::duplicate_record(RecordKind::Acceptance), "Pengajuan"))
    }

    async fn update_acceptance(&self, request_id: i32, changes: AcceptanceChanges) -> StoreResult<Acceptance> {
        queries::lifecycle::update_acceptance(&self.pool, request_id, &changes)
            .await?
            .ok_or(StoreError::NotFound(RecordKind::Acceptance.label()))
    }

    async fn find_monitoring(&self, request_id: i32) -> StoreResult<Option<Monitoring>> {
        Ok(queries::lifecycle::find_monitoring(&self.pool, request_id).await?)
    }

    async fn create_monitoring(&self, request_id: i32, record: MonitoringFields) -> StoreResult<Monitoring> {
        queries::lifecycle::insert_monitoring(&self.pool, request_id, &record)
            .await
            .map_err(|e| classify(e, || StoreError::duplicate_record(RecordKind::Monitoring), "Pengajuan"))
    }

    async fn update_monitoring(&self, request_id: i32, changes: MonitoringFields) -> StoreResult<Monitoring> {
        queries::lifecycle::update_monitoring(&self.pool, request_id, &changes)
            .await?
            .ok_or(StoreError::NotFound(RecordKind::Monitoring.label()))
    }

    async fn find_backup(&self, request_id: i32) -> StoreResult<Option<Backup>> {
        Ok(queries::lifecycle::find_backup(&self.pool, request_id).await?)
    }

    async fn create_backup(&self, request_id: i32, record: NewBackup) -> StoreResult<Backup> {
        queries::lifecycle::insert_backup(&self.pool, request_id, &record)
            .await
            .map_err(|e| classify(e, || StoreError::duplicate_record(RecordKind::Backup), "Pengajuan"))
    }

    async fn update_backup(&self, request_id: i32, changes: BackupChanges) -> StoreResult<Backup> {
        queries::lifecycle::update_backup(&self.pool, request_id, &changes)
            .await?
            .ok_or(StoreError::NotFound(RecordKind::Backup.label()))
    }

    async fn find_archive(&self, request_id: i32) -> StoreResult<Option<Archive>> {
        Ok(queries::lifecycle::find_archive(&self.pool, request_id).await?)
    }

    async fn create_archive(&self, request_id: i32, record: ArchiveNote) -> StoreResult<Archive> {
        queries::lifecycle::insert_archive(&self.pool, request_id, &record)
            .await
            .map_err(|e| classify(e, || StoreError::duplicate_record(RecordKind::Archive), "Pengajuan"))
    }

    async fn update_archive(&self, request_id: i32, changes: ArchiveNote) -> StoreResult<Archive> {
        queries::lifecycle::update_archive(&self.pool, request_id, &changes)
            .await?
            .ok_or(StoreError::NotFound(RecordKind::Archive.label()))
    }

    async fn find_follow_up(&self, request_id: i32) -> StoreResult<Option<FollowUp>> {
        Ok(queries::lifecycle::find_follow_up(&self.pool, request_id).await?)
    }

    async fn create_follow_up(&self, request_id: i32, record: NewFollowUp) -> StoreResult<FollowUp> {
        queries::lifecycle::insert_follow_up(&self.pool, request_id, &record)
            .await
            .map_err(|e| classify(e, || StoreError::duplicate_record(RecordKind::FollowUp), "Pengajuan"))
    }

    async fn update_follow_up(&self, request_id: i32, changes: FollowUpChanges) -> StoreResult<FollowUp> {
        queries::lifecycle::update_follow_up(&self.pool, request_id, &changes)
            .await?
            .ok_or(StoreError::NotFound(RecordKind::FollowUp.label()))
    }

    async fn find_confirmation(&self, request_id: i32) -> StoreResult<Option<Confirmation>> {
        Ok(queries::lifecycle::find_confirmation(&self.pool, request_id).await?)
    }

    async fn create_confirmation(
        &self,
        request_id: i32,
        user_id: i32,
        record: ConfirmationFields,
    ) -> StoreResult<Confirmation> {
        queries::lifecycle::insert_confirmation(&self.pool, request_id, user_id, &record)
            .await
            .map_err(|e| classify(e, || StoreError::duplicate_record(RecordKind::Confirmation), "Pengajuan"))
    }

    async fn update_confirmation(&self, request_id: i32, changes: ConfirmationFields) -> StoreResult<Confirmation> {
        queries::lifecycle::update_confirmation(&self.pool, request_id, &changes)
            .await?
            .ok_or(StoreError::NotFound(RecordKind::Confirmation.label()))
    }

    async fn delete_record(&self, kind: RecordKind, request_id: i32) -> StoreResult<()> {
        if queries::lifecycle::delete(&self.pool, kind, request_id).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound(kind.label()))
        }
    }

    async fn append_audit(&self, entry: NewAuditEntry) -> StoreResult<AuditLog> {
        queries::audit::insert(&self.pool, &entry)
            .await
            .map_err(|e| classify(e, || StoreError::Conflict("Duplicate audit entry.".into()), "Pengajuan"))
    }

    async fn list_audit(&self, request_id: i32) -> StoreResult<Vec<AuditLog>> {
        Ok(queries::audit::list_for_request(&self.pool, request_id).await?)
    }
}
