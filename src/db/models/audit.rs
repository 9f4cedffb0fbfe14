use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::db::models::lifecycle::RecordKind;
use crate::db::models::user::UserSummary;

/// What an audit row records. Persisted as its tag string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    RequestCreated,
    RequestUpdated,
    Decision,
    DecisionDeleted,
    StatusOverride,
    RecordCreated(RecordKind),
    RecordUpdated(RecordKind),
    RecordDeleted(RecordKind),
}

impl AuditAction {
    pub fn tag(&self) -> String {
        match self {
            AuditAction::RequestCreated => "PENGAJUAN".to_string(),
            AuditAction::RequestUpdated => "PENGAJUAN_UPDATE".to_string(),
            AuditAction::Decision => "PERSETUJUAN".to_string(),
            AuditAction::DecisionDeleted => "PERSETUJUAN_DELETE".to_string(),
            AuditAction::StatusOverride => "STATUS_UPDATE".to_string(),
            AuditAction::RecordCreated(kind) => kind.audit_base().to_string(),
            AuditAction::RecordUpdated(kind) => format!("{}_UPDATE", kind.audit_base()),
            AuditAction::RecordDeleted(kind) => format!("{}_DELETE", kind.audit_base()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, FromRow, ToSchema)]
pub struct AuditLog {
    pub id: i32,
    #[serde(rename = "pengajuanId")]
    pub request_id: i32,
    #[serde(rename = "userId")]
    pub user_id: Option<i32>,
    pub action: String,
    pub detail: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuditLogView {
    #[serde(flatten)]
    pub log: AuditLog,
    pub user: Option<UserSummary>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry {
    pub request_id: i32,
    pub user_id: Option<i32>,
    pub action: String,
    pub detail: Option<String>,
}

impl NewAuditEntry {
    pub fn new(request_id: i32, user_id: i32, action: AuditAction, detail: impl Into<String>) -> Self {
        Self {
            request_id,
            user_id: Some(user_id),
            action: action.tag(),
            detail: Some(detail.into()),
        }
    }

    pub fn without_detail(request_id: i32, user_id: i32, action: AuditAction) -> Self {
        Self {
            request_id,
            user_id: Some(user_id),
            action: action.tag(),
            detail: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_tags_get_suffixes() {
        assert_eq!(AuditAction::RecordCreated(RecordKind::FollowUp).tag(), "TINDAK_LANJUT");
        assert_eq!(AuditAction::RecordUpdated(RecordKind::Backup).tag(), "BACKUP_UPDATE");
        assert_eq!(AuditAction::RecordDeleted(RecordKind::Archive).tag(), "ARSIP_DELETE");
        assert_eq!(AuditAction::StatusOverride.tag(), "STATUS_UPDATE");
    }
}
