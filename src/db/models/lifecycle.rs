//! Per-request records entered after the approval chain: acceptance, monitoring, backup,
//! archive, follow-up and the requester's confirmation. At most one of each per request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::utils::validation::{trimmed, FieldErrors, LenientInt, Patch, Validate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Acceptance,
    Monitoring,
    Backup,
    Archive,
    FollowUp,
    Confirmation,
}

impl RecordKind {
    pub const ALL: [RecordKind; 6] = [
        RecordKind::Acceptance,
        RecordKind::Monitoring,
        RecordKind::Backup,
        RecordKind::Archive,
        RecordKind::FollowUp,
        RecordKind::Confirmation,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            RecordKind::Acceptance => "acceptances",
            RecordKind::Monitoring => "monitorings",
            RecordKind::Backup => "backups",
            RecordKind::Archive => "archives",
            RecordKind::FollowUp => "follow_ups",
            RecordKind::Confirmation => "confirmations",
        }
    }

    /// Human label used in response messages.
    pub fn label(&self) -> &'static str {
        match self {
            RecordKind::Acceptance => "Penerimaan",
            RecordKind::Monitoring => "Monitoring",
            RecordKind::Backup => "Backup",
            RecordKind::Archive => "Arsip",
            RecordKind::FollowUp => "Tindak lanjut",
            RecordKind::Confirmation => "Konfirmasi",
        }
    }

    /// Audit tag for creation; updates and deletes append `_UPDATE` / `_DELETE`.
    pub fn audit_base(&self) -> &'static str {
        match self {
            RecordKind::Acceptance => "PENERIMAAN",
            RecordKind::Monitoring => "MONITORING",
            RecordKind::Backup => "BACKUP",
            RecordKind::Archive => "ARSIP",
            RecordKind::FollowUp => "TINDAK_LANJUT",
            RecordKind::Confirmation => "KONFIRMASI",
        }
    }
}

// ---------------------------------------------------------------------------
// Acceptance (penerimaan)
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, FromRow, ToSchema)]
pub struct Acceptance {
    pub id: i32,
    #[serde(rename = "pengajuanId")]
    pub request_id: i32,
    #[serde(rename = "cpu")]
    pub cpu_cores: i32,
    #[serde(rename = "ram")]
    pub ram_gb: i32,
    #[serde(rename = "storage")]
    pub storage_gb: i32,
    #[serde(rename = "sistemOperasi")]
    pub operating_system: String,
    #[serde(rename = "softwareTambahan")]
    pub extra_software: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcceptanceInput {
    #[schema(value_type = Option<i64>)]
    pub cpu: Option<LenientInt>,
    #[schema(value_type = Option<i64>)]
    pub ram: Option<LenientInt>,
    #[schema(value_type = Option<i64>)]
    pub storage: Option<LenientInt>,
    pub sistem_operasi: Option<String>,
    pub software_tambahan: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewAcceptance {
    pub cpu_cores: i32,
    pub ram_gb: i32,
    pub storage_gb: i32,
    pub operating_system: String,
    pub extra_software: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcceptanceChanges {
    pub cpu_cores: Option<i32>,
    pub ram_gb: Option<i32>,
    pub storage_gb: Option<i32>,
    pub operating_system: Option<String>,
    pub extra_software: Option<String>,
}

impl Validate for AcceptanceInput {
    type Output = NewAcceptance;

    fn validate(self) -> Result<NewAcceptance, FieldErrors> {
        let mut errors = FieldErrors::new();
        let cpu_cores = errors.required_int("cpu", self.cpu);
        let ram_gb = errors.required_int("ram", self.ram);
        let storage_gb = errors.required_int("storage", self.storage);
        let operating_system = errors.required_text("sistemOperasi", self.sistem_operasi);

        errors.finish(NewAcceptance {
            cpu_cores,
            ram_gb,
            storage_gb,
            operating_system,
            extra_software: trimmed(self.software_tambahan),
        })
    }
}

impl Validate for Patch<AcceptanceInput> {
    type Output = AcceptanceChanges;

    fn validate(self) -> Result<AcceptanceChanges, FieldErrors> {
        let input = self.0;
        let mut errors = FieldErrors::new();
        let changes = AcceptanceChanges {
            cpu_cores: errors.optional_int("cpu", input.cpu),
            ram_gb: errors.optional_int("ram", input.ram),
            storage_gb: errors.optional_int("storage", input.storage),
            operating_system: errors.non_blank("sistemOperasi", input.sistem_operasi),
            extra_software: trimmed(input.software_tambahan),
        };
        if errors.is_empty() && changes == AcceptanceChanges::default() {
            errors.push("body", "No fields to update");
        }
        errors.finish(changes)
    }
}

// ---------------------------------------------------------------------------
// Monitoring
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, FromRow, ToSchema)]
pub struct Monitoring {
    pub id: i32,
    #[serde(rename = "pengajuanId")]
    pub request_id: i32,
    #[serde(rename = "ipAddress")]
    pub ip_address: Option<String>,
    pub host: Option<String>,
    #[serde(rename = "statusMonitoring")]
    pub state: Option<String>,
    pub uptime: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringInput {
    pub ip_address: Option<String>,
    pub host: Option<String>,
    pub status_monitoring: Option<String>,
    pub uptime: Option<String>,
}

/// Used for both create and update; at least one field must be present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitoringFields {
    pub ip_address: Option<String>,
    pub host: Option<String>,
    pub state: Option<String>,
    pub uptime: Option<String>,
}

impl Validate for MonitoringInput {
    type Output = MonitoringFields;

    fn validate(self) -> Result<MonitoringFields, FieldErrors> {
        let fields = MonitoringFields {
            ip_address: trimmed(self.ip_address),
            host: trimmed(self.host),
            state: trimmed(self.status_monitoring),
            uptime: trimmed(self.uptime),
        };
        let mut errors = FieldErrors::new();
        if fields == MonitoringFields::default() {
            errors.push("body", "At least one monitoring field is required");
        }
        errors.finish(fields)
    }
}

impl Validate for Patch<MonitoringInput> {
    type Output = MonitoringFields;

    fn validate(self) -> Result<MonitoringFields, FieldErrors> {
        self.0.validate()
    }
}

// ---------------------------------------------------------------------------
// Backup
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, FromRow, ToSchema)]
pub struct Backup {
    pub id: i32,
    #[serde(rename = "pengajuanId")]
    pub request_id: i32,
    #[serde(rename = "periodeBackup")]
    pub period: String,
    #[serde(rename = "tanggalTerakhir")]
    pub last_run: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackupInput {
    pub periode_backup: Option<String>,
    /// RFC 3339 timestamp or `YYYY-MM-DD`.
    pub tanggal_terakhir: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewBackup {
    pub period: String,
    pub last_run: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackupChanges {
    pub period: Option<String>,
    pub last_run: Option<DateTime<Utc>>,
}

impl Validate for BackupInput {
    type Output = NewBackup;

    fn validate(self) -> Result<NewBackup, FieldErrors> {
        let mut errors = FieldErrors::new();
        let period = errors.required_text("periodeBackup", self.periode_backup);
        let last_run = errors.optional_date("tanggalTerakhir", self.tanggal_terakhir);
        errors.finish(NewBackup { period, last_run })
    }
}

impl Validate for Patch<BackupInput> {
    type Output = BackupChanges;

    fn validate(self) -> Result<BackupChanges, FieldErrors> {
        let input = self.0;
        let mut errors = FieldErrors::new();
        let changes = BackupChanges {
            period: errors.non_blank("periodeBackup", input.periode_backup),
            last_run: errors.optional_date("tanggalTerakhir", input.tanggal_terakhir),
        };
        if errors.is_empty() && changes == BackupChanges::default() {
            errors.push("body", "No fields to update");
        }
        errors.finish(changes)
    }
}

// ---------------------------------------------------------------------------
// Archive (arsip)
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, FromRow, ToSchema)]
pub struct Archive {
    pub id: i32,
    #[serde(rename = "pengajuanId")]
    pub request_id: i32,
    #[serde(rename = "catatan")]
    pub note: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ArchiveInput {
    pub catatan: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArchiveNote {
    pub note: Option<String>,
}

impl Validate for ArchiveInput {
    type Output = ArchiveNote;

    fn validate(self) -> Result<ArchiveNote, FieldErrors> {
        Ok(ArchiveNote {
            note: trimmed(self.catatan),
        })
    }
}

impl Validate for Patch<ArchiveInput> {
    type Output = ArchiveNote;

    fn validate(self) -> Result<ArchiveNote, FieldErrors> {
        let mut errors = FieldErrors::new();
        let note = errors.required_text("catatan", self.0.catatan);
        errors.finish(ArchiveNote { note: Some(note) })
    }
}

// ---------------------------------------------------------------------------
// Follow-up (tindak lanjut)
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, FromRow, ToSchema)]
pub struct FollowUp {
    pub id: i32,
    #[serde(rename = "pengajuanId")]
    pub request_id: i32,
    #[serde(rename = "deskripsi")]
    pub description: String,
    #[serde(rename = "tanggalMulai")]
    pub starts_on: DateTime<Utc>,
    #[serde(rename = "tanggalSelesai")]
    pub ends_on: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpInput {
    pub deskripsi: Option<String>,
    pub tanggal_mulai: Option<String>,
    pub tanggal_selesai: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewFollowUp {
    pub description: String,
    pub starts_on: DateTime<Utc>,
    pub ends_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FollowUpChanges {
    pub description: Option<String>,
    pub starts_on: Option<DateTime<Utc>>,
    pub ends_on: Option<DateTime<Utc>>,
}

impl Validate for FollowUpInput {
    type Output = NewFollowUp;

    fn validate(self) -> Result<NewFollowUp, FieldErrors> {
        let mut errors = FieldErrors::new();
        let description = errors.required_text("deskripsi", self.deskripsi);
        let starts_on = errors.required_date("tanggalMulai", self.tanggal_mulai);
        let ends_on = errors.optional_date("tanggalSelesai", self.tanggal_selesai);

        match starts_on {
            Some(starts_on) => errors.finish(NewFollowUp {
                description,
                starts_on,
                ends_on,
            }),
            None => Err(errors),
        }
    }
}

impl Validate for Patch<FollowUpInput> {
    type Output = FollowUpChanges;

    fn validate(self) -> Result<FollowUpChanges, FieldErrors> {
        let input = self.0;
        let mut errors = FieldErrors::new();
        let changes = FollowUpChanges {
            description: errors.non_blank("deskripsi", input.deskripsi),
            starts_on: errors.optional_date("tanggalMulai", input.tanggal_mulai),
            ends_on: errors.optional_date("tanggalSelesai", input.tanggal_selesai),
        };
        if errors.is_empty() && changes == FollowUpChanges::default() {
            errors.push("body", "No fields to update");
        }
        errors.finish(changes)
    }
}

// ---------------------------------------------------------------------------
// Confirmation (konfirmasi layanan)
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, FromRow, ToSchema)]
pub struct Confirmation {
    pub id: i32,
    #[serde(rename = "pengajuanId")]
    pub request_id: i32,
    #[serde(rename = "userId")]
    pub user_id: i32,
    #[serde(rename = "status")]
    pub state: String,
    #[serde(rename = "catatan")]
    pub note: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ConfirmationInput {
    pub status: Option<String>,
    pub catatan: Option<String>,
}

/// Used for both create and update; `state` is always required.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmationFields {
    pub state: String,
    pub note: Option<String>,
}

impl Validate for ConfirmationInput {
    type Output = ConfirmationFields;

    fn validate(self) -> Result<ConfirmationFields, FieldErrors> {
        let mut errors = FieldErrors::new();
        let state = errors.required_text("status", self.status);
        errors.finish(ConfirmationFields {
            state,
            note: trimmed(self.catatan),
        })
    }
}

impl Validate for Patch<ConfirmationInput> {
    type Output = ConfirmationFields;

    fn validate(self) -> Result<ConfirmationFields, FieldErrors> {
        self.0.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn acceptance_patch_without_fields_is_rejected() {
        let patch: Patch<AcceptanceInput> = serde_json::from_value(json!({})).unwrap();
        let errors = patch.validate().unwrap_err().into_inner();
        assert_eq!(errors[0].field, "body");
    }

    #[test]
    fn monitoring_needs_at_least_one_field() {
        let empty: MonitoringInput = serde_json::from_value(json!({ "host": "  " })).unwrap();
        assert!(empty.validate().is_err());

        let filled: MonitoringInput =
            serde_json::from_value(json!({ "ipAddress": "10.0.0.7" })).unwrap();
        assert_eq!(filled.validate().unwrap().ip_address.as_deref(), Some("10.0.0.7"));
    }

    #[test]
    fn follow_up_requires_a_parseable_start_date() {
        let input: FollowUpInput = serde_json::from_value(json!({
            "deskripsi": "Migrasi disk",
            "tanggalMulai": "besok"
        }))
        .unwrap();
        let errors = input.validate().unwrap_err().into_inner();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "tanggalMulai");

        let input: FollowUpInput = serde_json::from_value(json!({
            "deskripsi": "Migrasi disk",
            "tanggalMulai": "2025-04-01",
            "tanggalSelesai": "2025-04-03T17:00:00Z"
        }))
        .unwrap();
        let follow_up = input.validate().unwrap();
        assert!(follow_up.ends_on.unwrap() > follow_up.starts_on);
    }

    #[test]
    fn archive_update_requires_a_note() {
        let patch: Patch<ArchiveInput> = serde_json::from_value(json!({})).unwrap();
        assert!(patch.validate().is_err());

        let create: ArchiveInput = serde_json::from_value(json!({})).unwrap();
        assert_eq!(create.validate().unwrap(), ArchiveNote::default());
    }

    #[test]
    fn audit_tags_follow_record_kind() {
        let bases: Vec<&str> = RecordKind::ALL.iter().map(RecordKind::audit_base).collect();
        assert_eq!(
            bases,
            vec!["PENERIMAAN", "MONITORING", "BACKUP", "ARSIP", "TINDAK_LANJUT", "KONFIRMASI"]
        );
    }
}
