use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::db::models::role::Role;
use crate::db::models::user::UserSummary;
use crate::utils::validation::{trimmed, FieldErrors, LenientInt, Validate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "approval_decision")]
pub enum Decision {
    #[serde(rename = "DISETUJUI", alias = "APPROVED")]
    #[sqlx(rename = "DISETUJUI")]
    Approved,
    #[serde(rename = "DITOLAK", alias = "REJECTED")]
    #[sqlx(rename = "DITOLAK")]
    Rejected,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approved => "DISETUJUI",
            Decision::Rejected => "DITOLAK",
        }
    }

    pub fn parse(raw: &str) -> Option<Decision> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "DISETUJUI" | "APPROVED" => Some(Decision::Approved),
            "DITOLAK" | "REJECTED" => Some(Decision::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decision (`persetujuan`) on a request. `decider_role` is the decider's role at decision time.
#[derive(Serialize, Deserialize, Debug, Clone, FromRow, ToSchema)]
pub struct Approval {
    pub id: i32,
    #[serde(rename = "pengajuanId")]
    pub request_id: i32,
    #[serde(rename = "userId")]
    pub user_id: i32,
    #[serde(rename = "role")]
    pub decider_role: Role,
    #[serde(rename = "status")]
    pub decision: Decision,
    #[serde(rename = "catatan")]
    pub note: Option<String>,
    #[serde(rename = "tanggal")]
    pub decided_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApprovalView {
    #[serde(flatten)]
    pub approval: Approval,
    pub user: Option<UserSummary>,
}

#[derive(Debug, Clone)]
pub struct NewApproval {
    pub request_id: i32,
    pub user_id: i32,
    pub decider_role: Role,
    pub decision: Decision,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DecisionInput {
    #[serde(rename = "pengajuanId")]
    #[schema(value_type = Option<i64>)]
    pub pengajuan_id: Option<LenientInt>,
    /// `DISETUJUI`/`DITOLAK` (or `APPROVED`/`REJECTED`).
    pub status: Option<String>,
    pub catatan: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecisionRequest {
    pub request_id: i32,
    pub decision: Decision,
    pub note: Option<String>,
}

impl Validate for DecisionInput {
    type Output = DecisionRequest;

    fn validate(self) -> Result<DecisionRequest, FieldErrors> {
        let mut errors = FieldErrors::new();
        let request_id = errors.required_int("pengajuanId", self.pengajuan_id);
        let decision = match trimmed(self.status) {
            Some(raw) => Decision::parse(&raw).unwrap_or_else(|| {
                errors.push("status", "Expected DISETUJUI or DITOLAK");
                Decision::Rejected
            }),
            None => {
                errors.push("status", "Required");
                Decision::Rejected
            }
        };

        errors.finish(DecisionRequest {
            request_id,
            decision,
            note: trimmed(self.catatan),
        })
    }
}
