use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

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
use crate::db::store::{RecordStore, RecordedDecision, StoreError, StoreResult, Transition};

/// Sub-records hanging off a single request.
trait PerRequest: Clone {
    fn request_id(&self) -> i32;
}

macro_rules! per_request {
    ($($record:ty),*) => {
        $(impl PerRequest for $record {
            fn request_id(&self) -> i32 {
                self.request_id
            }
        })*
    };
}

per_request!(Acceptance, Monitoring, Backup, Archive, FollowUp, Confirmation);

fn find_for<T: PerRequest>(rows: &[T], request_id: i32) -> Option<T> {
    rows.iter().find(|row| row.request_id() == request_id).cloned()
}

fn find_for_mut<T: PerRequest>(rows: &mut [T], request_id: i32, kind: RecordKind) -> StoreResult<&mut T> {
    rows.iter_mut()
        .find(|row| row.request_id() == request_id)
        .ok_or(StoreError::NotFound(kind.label()))
}

fn remove_for<T: PerRequest>(rows: &mut Vec<T>, request_id: i32, kind: RecordKind) -> StoreResult<()> {
    let before = rows.len();
    rows.retain(|row| row.request_id() != request_id);
    if rows.len() == before {
        return Err(StoreError::NotFound(kind.label()));
    }
    Ok(())
}

fn newest_first<T: Clone>(rows: impl Iterator<Item = T>, key: impl Fn(&T) -> (DateTime<Utc>, i32)) -> Vec<T> {
    let mut rows: Vec<T> = rows.collect();
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
    rows
}

#[derive(Default)]
struct Tables {
    sequences: HashMap<&'static str, i32>,
    users: Vec<User>,
    requests: Vec<ServerRequest>,
    approvals: Vec<Approval>,
    acceptances: Vec<Acceptance>,
    monitorings: Vec<Monitoring>,
    backups: Vec<Backup>,
    archives: Vec<Archive>,
    follow_ups: Vec<FollowUp>,
    confirmations: Vec<Confirmation>,
    audit: Vec<AuditLog>,
}

impl Tables {
    fn next_id(&mut self, table: &'static str) -> i32 {
        let sequence = self.sequences.entry(table).or_insert(0);
        *sequence += 1;
        *sequence
    }

    fn require_request(&self, id: i32) -> StoreResult<()> {
        if self.requests.iter().any(|request| request.id == id) {
            Ok(())
        } else {
            Err(StoreError::NotFound("Pengajuan"))
        }
    }

    fn request_mut(&mut self, id: i32) -> StoreResult<&mut ServerRequest> {
        self.requests
            .iter_mut()
            .find(|request| request.id == id)
            .ok_or(StoreError::NotFound("Pengajuan"))
    }

    fn ensure_absent<T: PerRequest>(&self, rows: &[T], request_id: i32, kind: RecordKind) -> StoreResult<()> {
        self.require_request(request_id)?;
        if find_for(rows, request_id).is_some() {
            return Err(StoreError::duplicate_record(kind));
        }
        Ok(())
    }

    fn insert_audit(&mut self, entry: NewAuditEntry) -> AuditLog {
        let log = AuditLog {
            id: self.next_id("audit_logs"),
            request_id: entry.request_id,
            user_id: entry.user_id,
            action: entry.action,
            detail: entry.detail,
            created_at: Utc::now(),
        };
        self.audit.push(log.clone());
        log
    }

    fn cascade_request(&mut self, id: i32) {
        self.requests.retain(|request| request.id != id);
        self.approvals.retain(|approval| approval.request_id != id);
        self.acceptances.retain(|row| row.request_id != id);
        self.monitorings.retain(|row| row.request_id != id);
        self.backups.retain(|row| row.request_id != id);
        self.archives.retain(|row| row.request_id != id);
        self.follow_ups.retain(|row| row.request_id != id);
        self.confirmations.retain(|row| row.request_id != id);
        self.audit.retain(|log| log.request_id != id);
    }
}

/// `RecordStore` kept in process memory, mirroring the Postgres constraints and cascades.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn find_user(&self, id: i32) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|user| user.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list_users(&self, role: Option<Role>) -> StoreResult<Vec<User>> {
        let tables = self.tables.read().await;
        let users = tables
            .users
            .iter()
            .filter(|user| role.is_none_or(|role| user.role == role))
            .cloned();
        Ok(newest_first(users, |user| (user.created_at, user.id)))
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(StoreError::duplicate_email());
        }
        let created = User {
            id: tables.next_id("users"),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            phone: user.phone,
            role: user.role,
            created_at: Utc::now(),
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn update_user(&self, id: i32, changes: UserChanges) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .iter()
            .any(|u| u.id != id && u.email.eq_ignore_ascii_case(&changes.email))
        {
            return Err(StoreError::duplicate_email());
        }
        let user = tables
            .users
            .iter_mut()
            .find(|user| user.id == id)
            .ok_or(StoreError::NotFound("User"))?;
        user.name = changes.name;
        user.email = changes.email;
        user.phone = changes.phone;
        Ok(user.clone())
    }

    async fn delete_user(&self, id: i32) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.users.iter().any(|user| user.id == id) {
            return Err(StoreError::NotFound("User"));
        }
        let owned: Vec<i32> = tables
            .requests
            .iter()
            .filter(|request| request.owner_id == id)
            .map(|request| request.id)
            .collect();
        for request_id in owned {
            tables.cascade_request(request_id);
        }
        tables.approvals.retain(|approval| approval.user_id != id);
        tables.confirmations.retain(|row| row.user_id != id);
        for log in tables.audit.iter_mut().filter(|log| log.user_id == Some(id)) {
            log.user_id = None;
        }
        tables.users.retain(|user| user.id != id);
        Ok(())
    }

    async fn create_request(&self, owner_id: i32, request: NewServerRequest) -> StoreResult<ServerRequest> {
        let mut tables = self.tables.write().await;
        if !tables.users.iter().any(|user| user.id == owner_id) {
            return Err(StoreError::NotFound("User"));
        }
        let created = ServerRequest {
            id: tables.next_id("server_requests"),
            owner_id,
            contact_name: request.contact_name,
            contact_position: request.contact_position,
            contact_email: request.contact_email,
            contact_phone: request.contact_phone,
            system_name: request.system_name,
            system_owner: request.system_owner,
            system_users: request.system_users,
            system_purpose: request.system_purpose,
            public_access: request.public_access,
            service_address: request.service_address,
            port: request.port,
            cpu_cores: request.cpu_cores,
            ram_gb: request.ram_gb,
            gpu: request.gpu,
            storage_gb: request.storage_gb,
            operating_system: request.operating_system,
            extra_software: request.extra_software,
            ssh_user: request.ssh_user,
            ssh_password: request.ssh_password,
            database_kind: request.database_kind,
            database_user: request.database_user,
            database_password: request.database_password,
            status: RequestStatus::Submitted,
            submitted_at: Utc::now(),
        };
        tables.requests.push(created.clone());
        Ok(created)
    }

    async fn find_request(&self, id: i32) -> StoreResult<Option<ServerRequest>> {
        let tables = self.tables.read().await;
        Ok(tables.requests.iter().find(|request| request.id == id).cloned())
    }

    async fn list_requests(&self, owner_id: Option<i32>) -> StoreResult<Vec<ServerRequest>> {
        let tables = self.tables.read().await;
        let requests = tables
            .requests
            .iter()
            .filter(|request| owner_id.is_none_or(|owner| request.owner_id == owner))
            .cloned();
        Ok(newest_first(requests, |request| (request.submitted_at, request.id)))
    }

    async fn update_request(&self, id: i32, changes: RequestChanges) -> StoreResult<ServerRequest> {
        let mut tables = self.tables.write().await;
        let request = tables.request_mut(id)?;
        changes.apply(request);
        Ok(request.clone())
    }

    async fn set_request_status(&self, id: i32, status: RequestStatus) -> StoreResult<ServerRequest> {
        let mut tables = self.tables.write().await;
        let request = tables.request_mut(id)?;
        request.status = status;
        Ok(request.clone())
    }

    async fn delete_request(&self, id: i32) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.require_request(id)?;
        tables.cascade_request(id);
        Ok(())
    }

    async fn list_approvals(&self, request_id: Option<i32>) -> StoreResult<Vec<Approval>> {
        let tables = self.tables.read().await;
        let approvals = tables
            .approvals
            .iter()
            .filter(|approval| request_id.is_none_or(|id| approval.request_id == id))
            .cloned();
        Ok(newest_first(approvals, |approval| (approval.decided_at, approval.id)))
    }

    async fn find_approval_by_role(&self, request_id: i32, role: Role) -> StoreResult<Option<Approval>> {
        let tables = self.tables.read().await;
        Ok(tables
            .approvals
            .iter()
            .find(|approval| approval.request_id == request_id && approval.decider_role == role)
            .cloned())
    }

    async fn record_decision(
        &self,
        approval: NewApproval,
        transition: Transition<'_>,
        audit: NewAuditEntry,
    ) -> StoreResult<RecordedDecision> {
        let mut tables = self.tables.write().await;
        tables.require_request(approval.request_id)?;
        if tables.approvals.iter().any(|existing| {
            existing.request_id == approval.request_id && existing.decider_role == approval.decider_role
        }) {
            return Err(StoreError::duplicate_decision());
        }

        let created = Approval {
            id: tables.next_id("approvals"),
            request_id: approval.request_id,
            user_id: approval.user_id,
            decider_role: approval.decider_role,
            decision: approval.decision,
            note: approval.note,
            decided_at: Utc::now(),
        };
        tables.approvals.push(created.clone());

        let request = tables.request_mut(created.request_id)?;
        let previous_status = request.status;
        request.status = transition(previous_status);
        let request = request.clone();

        tables.insert_audit(audit);
        Ok(RecordedDecision {
            approval: created,
            previous_status,
            request,
        })
    }

    async fn delete_approval(&self, id: i32) -> StoreResult<Approval> {
        let mut tables = self.tables.write().await;
        let position = tables
            .approvals
            .iter()
            .position(|approval| approval.id == id)
            .ok_or(StoreError::NotFound("Persetujuan"))?;
        Ok(tables.approvals.remove(position))
    }

    async fn find_acceptance(&self, request_id: i32) -> StoreResult<Option<Acceptance>> {
        Ok(find_for(&self.tables.read().await.acceptances, request_id))
    }

    async fn create_acceptance(&self, request_id: i32, record: NewAcceptance) -> StoreResult<Acceptance> {
        let mut tables = self.tables.write().await;
        tables.ensure_absent(&tables.acceptances, request_id, RecordKind::Acceptance)?;
        let created = Acceptance {
            id: tables.next_id("acceptances"),
            request_id,
            cpu_cores: record.cpu_cores,
            ram_gb: record.ram_gb,
            storage_gb: record.storage_gb,
            operating_system: record.operating_system,
            extra_software: record.extra_software,
            created_at: Utc::now(),
        };
        tables.acceptances.push(created.clone());
        Ok(created)
    }

    async fn update_acceptance(&self, request_id: i32, changes: AcceptanceChanges) -> StoreResult<Acceptance> {
        let mut tables = self.tables.write().await;
        let row = find_for_mut(&mut tables.acceptances, request_id, RecordKind::Acceptance)?;
        if let Some(cpu_cores) = changes.cpu_cores {
            row.cpu_cores = cpu_cores;
        }
        if let Some(ram_gb) = changes.ram_gb {
            row.ram_gb = ram_gb;
        }
        if let Some(storage_gb) = changes.storage_gb {
            row.storage_gb = storage_gb;
        }
        if let Some(operating_system) = changes.operating_system {
            row.operating_system = operating_system;
        }
        if changes.extra_software.is_some() {
            row.extra_software = changes.extra_software;
        }
        Ok(row.clone())
    }

    async fn find_monitoring(&self, request_id: i32) -> StoreResult<Option<Monitoring>> {
        Ok(find_for(&self.tables.read().await.monitorings, request_id))
    }

    async fn create_monitoring(&self, request_id: i32, record: MonitoringFields) -> StoreResult<Monitoring> {
        let mut tables = self.tables.write().await;
        tables.ensure_absent(&tables.monitorings, request_id, RecordKind::Monitoring)?;
        let created = Monitoring {
            id: tables.next_id("monitorings"),
            request_id,
            ip_address: record.ip_address,
            host: record.host,
            state: record.state,
            uptime: record.uptime,
            created_at: Utc::now(),
        };
        tables.monitorings.push(created.clone());
        Ok(created)
    }

    async fn update_monitoring(&self, request_id: i32, changes: MonitoringFields) -> StoreResult<Monitoring> {
        let mut tables = self.tables.write().await;
        let row = find_for_mut(&mut tables.monitorings, request_id, RecordKind::Monitoring)?;
        if changes.ip_address.is_some() {
            row.ip_address = changes.ip_address;
        }
        if changes.host.is_some() {
            row.host = changes.host;
        }
        if changes.state.is_some() {
            row.state = changes.state;
        }
        if changes.uptime.is_some() {
            row.uptime = changes.uptime;
        }
        Ok(row.clone())
    }

    async fn find_backup(&self, request_id: i32) -> StoreResult<Option<Backup>> {
        Ok(find_for(&self.tables.read().await.backups, request_id))
    }

    async fn create_backup(&self, request_id: i32, record: NewBackup) -> StoreResult<Backup> {
        let mut tables = self.tables.write().await;
        tables.ensure_absent(&tables.backups, request_id, RecordKind::Backup)?;
        let created = Backup {
            id: tables.next_id("backups"),
            request_id,
            period: record.period,
            last_run: record.last_run,
            created_at: Utc::now(),
        };
        tables.backups.push(created.clone());
        Ok(created)
    }

    async fn update_backup(&self, request_id: i32, changes: BackupChanges) -> StoreResult<Backup> {
        let mut tables = self.tables.write().await;
        let row = find_for_mut(&mut tables.backups, request_id, RecordKind::Backup)?;
        if let Some(period) = changes.period {
            row.period = period;
        }
        if changes.last_run.is_some() {
            row.last_run = changes.last_run;
        }
        Ok(row.clone())
    }

    async fn find_archive(&self, request_id: i32) -> StoreResult<Option<Archive>> {
        Ok(find_for(&self.tables.read().await.archives, request_id))
    }

    async fn create_archive(&self, request_id: i32, record: ArchiveNote) -> StoreResult<Archive> {
        let mut tables = self.tables.write().await;
        tables.ensure_absent(&tables.archives, request_id, RecordKind::Archive)?;
        let created = Archive {
            id: tables.next_id("archives"),
            request_id,
            note: record.note,
            created_at: Utc::now(),
        };
        tables.archives.push(created.clone());
        Ok(created)
    }

    async fn update_archive(&self, request_id: i32, changes: ArchiveNote) -> StoreResult<Archive> {
        let mut tables = self.tables.write().await;
        let row = find_for_mut(&mut tables.archives, request_id, RecordKind::Archive)?;
        if changes.note.is_some() {
            row.note = changes.note;
        }
        Ok(row.clone())
    }

    async fn find_follow_up(&self, request_id: i32) -> StoreResult<Option<FollowUp>> {
        Ok(find_for(&self.tables.read().await.follow_ups, request_id))
    }

    async fn create_follow_up(&self, request_id: i32, record: NewFollowUp) -> StoreResult<FollowUp> {
        let mut tables = self.tables.write().await;
        tables.ensure_absent(&tables.follow_ups, request_id, RecordKind::FollowUp)?;
        let created = FollowUp {
            id: tables.next_id("follow_ups"),
            request_id,
            description: record.description,
            starts_on: record.starts_on,
            ends_on: record.ends_on,
            created_at: Utc::now(),
        };
        tables.follow_ups.push(created.clone());
        Ok(created)
    }

    async fn update_follow_up(&self, request_id: i32, changes: FollowUpChanges) -> StoreResult<FollowUp> {
        let mut tables = self.tables.write().await;
        let row = find_for_mut(&mut tables.follow_ups, request_id, RecordKind::FollowUp)?;
        if let Some(description) = changes.description {
            row.description = description;
        }
        if let Some(starts_on) = changes.starts_on {
            row.starts_on = starts_on;
        }
        if changes.ends_on.is_some() {
            row.ends_on = changes.ends_on;
        }
        Ok(row.clone())
    }

    async fn find_confirmation(&self, request_id: i32) -> StoreResult<Option<Confirmation>> {
        Ok(find_for(&self.tables.read().await.confirmations, request_id))
    }

    async fn create_confirmation(
        &self,
        request_id: i32,
        user_id: i32,
        record: ConfirmationFields,
    ) -> StoreResult<Confirmation> {
        let mut tables = self.tables.write().await;
        tables.ensure_absent(&tables.confirmations, request_id, RecordKind::Confirmation)?;
        let created = Confirmation {
            id: tables.next_id("confirmations"),
            request_id,
            user_id,
            state: record.state,
            note: record.note,
            created_at: Utc::now(),
        };
        tables.confirmations.push(created.clone());
        Ok(created)
    }

    async fn update_confirmation(&self, request_id: i32, changes: ConfirmationFields) -> StoreResult<Confirmation> {
        let mut tables = self.tables.write().await;
        let row = find_for_mut(&mut tables.confirmations, request_id, RecordKind::Confirmation)?;
        row.state = changes.state;
        if changes.note.is_some() {
            row.note = changes.note;
        }
        Ok(row.clone())
    }

    async fn delete_record(&self, kind: RecordKind, request_id: i32) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        match kind {
            RecordKind::Acceptance => remove_for(&mut tables.acceptances, request_id, kind),
            RecordKind::Monitoring => remove_for(&mut tables.monitorings, request_id, kind),
            RecordKind::Backup => remove_for(&mut tables.backups, request_id, kind),
            RecordKind::Archive => remove_for(&mut tables.archives, request_id, kind),
            RecordKind::FollowUp => remove_for(&mut tables.follow_ups, request_id, kind),
            RecordKind::Confirmation => remove_for(&mut tables.confirmations, request_id, kind),
        }
    }

    async fn append_audit(&self, entry: NewAuditEntry) -> StoreResult<AuditLog> {
        let mut tables = self.tables.write().await;
        tables.require_request(entry.request_id)?;
        Ok(tables.insert_audit(entry))
    }

    async fn list_audit(&self, request_id: i32) -> StoreResult<Vec<AuditLog>> {
        let tables = self.tables.read().await;
        let logs = tables
            .audit
            .iter()
            .filter(|log| log.request_id == request_id)
            .cloned();
        Ok(newest_first(logs, |log| (log.created_at, log.id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::approval::Decision;
    use crate::db::models::audit::AuditAction;
    use crate::workflow::transition::next_status;

    async fn store_with_request() -> (InMemoryStore, User, ServerRequest) {
        let store = InMemoryStore::new();
        let owner = store
            .create_user(NewUser {
                name: "Pemohon".into(),
                email: "pemohon@demo.com".into(),
                password_hash: "hash".into(),
                phone: Some("0812".into()),
                role: Role::Requester,
            })
            .await
            .unwrap();
        let request = store
            .create_request(
                owner.id,
                NewServerRequest {
                    system_name: "SIAKAD".into(),
                    cpu_cores: 2,
                    ram_gb: 4,
                    storage_gb: 40,
                    operating_system: "Debian".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        (store, owner, request)
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let (store, owner, _) = store_with_request().await;
        let err = store
            .create_user(NewUser {
                name: "Other".into(),
                email: owner.email.to_uppercase(),
                password_hash: "hash".into(),
                phone: None,
                role: Role::Staff,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn second_decision_from_same_role_is_rejected_atomically() {
        let (store, owner, request) = store_with_request().await;
        let decide = |note: &str| {
            (
                NewApproval {
                    request_id: request.id,
                    user_id: owner.id,
                    decider_role: Role::LabHead,
                    decision: Decision::Approved,
                    note: Some(note.to_string()),
                },
                NewAuditEntry::new(request.id, owner.id, AuditAction::Decision, note),
            )
        };

        let (approval, audit) = decide("first");
        let recorded = store
            .record_decision(approval, &|_| RequestStatus::UnderReview, audit)
            .await
            .unwrap();
        assert_eq!(recorded.previous_status, RequestStatus::Submitted);
        assert_eq!(recorded.request.status, RequestStatus::UnderReview);

        let (approval, audit) = decide("second");
        let err = store
            .record_decision(approval, &|_| RequestStatus::Rejected, audit)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let current = store.find_request(request.id).await.unwrap().unwrap();
        assert_eq!(current.status, RequestStatus::UnderReview);
        assert_eq!(store.list_approvals(Some(request.id)).await.unwrap().len(), 1);
        assert_eq!(store.list_audit(request.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn decision_applies_to_the_status_stored_at_write_time() {
        let (store, owner, request) = store_with_request().await;
        // The dean's rejection lands after the lab head's request was read.
        store
            .set_request_status(request.id, RequestStatus::Rejected)
            .await
            .unwrap();

        let recorded = store
            .record_decision(
                NewApproval {
                    request_id: request.id,
                    user_id: owner.id,
                    decider_role: Role::LabHead,
                    decision: Decision::Approved,
                    note: None,
                },
                &|current| next_status(current, Role::LabHead, Decision::Approved),
                NewAuditEntry::new(request.id, owner.id, AuditAction::Decision, "late"),
            )
            .await
            .unwrap();

        assert_eq!(recorded.previous_status, RequestStatus::Rejected);
        assert_eq!(recorded.request.status, RequestStatus::Rejected);
    }

    #[tokio::test]
    async fn sub_records_are_unique_per_request() {
        let (store, _, request) = store_with_request().await;
        store
            .create_archive(request.id, ArchiveNote { note: None })
            .await
            .unwrap();
        let err = store
            .create_archive(request.id, ArchiveNote { note: Some("again".into()) })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let missing = store
            .create_archive(request.id + 100, ArchiveNote::default())
            .await
            .unwrap_err();
        assert!(matches!(missing, StoreError::NotFound("Pengajuan")));
    }

    #[tokio::test]
    async fn deleting_a_request_cascades() {
        let (store, owner, request) = store_with_request().await;
        store
            .create_backup(request.id, NewBackup { period: "Harian".into(), last_run: None })
            .await
            .unwrap();
        store
            .append_audit(NewAuditEntry::without_detail(request.id, owner.id, AuditAction::RequestCreated))
            .await
            .unwrap();

        store.delete_request(request.id).await.unwrap();

        assert!(store.find_backup(request.id).await.unwrap().is_none());
        assert!(store.list_audit(request.id).await.unwrap().is_empty());
        assert!(matches!(
            store.delete_record(RecordKind::Backup, request.id).await,
            Err(StoreError::NotFound("Backup"))
        ));
    }

    #[tokio::test]
    async fn listings_are_newest_first() {
        let (store, owner, first) = store_with_request().await;
        let second = store
            .create_request(owner.id, NewServerRequest::default())
            .await
            .unwrap();

        let ids: Vec<i32> = store
            .list_requests(Some(owner.id))
            .await
            .unwrap()
            .into_iter()
            .map(|request| request.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }
}
