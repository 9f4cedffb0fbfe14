use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::db::models::approval::ApprovalView;
use crate::db::models::lifecycle::{Acceptance, Archive, Backup, Confirmation, FollowUp, Monitoring};
use crate::db::models::user::UserSummary;
use crate::utils::validation::{trimmed, FieldErrors, LenientInt, Validate};

/// Lifecycle status of a provisioning request. Stored as the `request_status` Postgres enum.
///
/// Display order: `Submitted < UnderReview < ApprovedStage1 < Suspended < InProgress < Fulfilled < Confirmed`.
/// `Rejected` sits outside the order. `Rejected` and `Confirmed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "request_status")]
pub enum RequestStatus {
    #[serde(rename = "DIAJUKAN", alias = "SUBMITTED")]
    #[sqlx(rename = "DIAJUKAN")]
    Submitted,
    #[serde(rename = "DIPERIKSA", alias = "UNDER_REVIEW")]
    #[sqlx(rename = "DIPERIKSA")]
    UnderReview,
    #[serde(rename = "DISETUJUI", alias = "APPROVED_STAGE1")]
    #[sqlx(rename = "DISETUJUI")]
    ApprovedStage1,
    #[serde(rename = "DITANGGUHKAN", alias = "SUSPENDED")]
    #[sqlx(rename = "DITANGGUHKAN")]
    Suspended,
    #[serde(rename = "DIPROSES", alias = "IN_PROGRESS")]
    #[sqlx(rename = "DIPROSES")]
    InProgress,
    #[serde(rename = "DISELESAIKAN", alias = "FULFILLED")]
    #[sqlx(rename = "DISELESAIKAN")]
    Fulfilled,
    #[serde(rename = "DITERIMA", alias = "CONFIRMED")]
    #[sqlx(rename = "DITERIMA")]
    Confirmed,
    #[serde(rename = "DITOLAK", alias = "REJECTED")]
    #[sqlx(rename = "DITOLAK")]
    Rejected,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 8] = [
        RequestStatus::Submitted,
        RequestStatus::UnderReview,
        RequestStatus::ApprovedStage1,
        RequestStatus::Suspended,
        RequestStatus::InProgress,
        RequestStatus::Fulfilled,
        RequestStatus::Confirmed,
        RequestStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Submitted => "DIAJUKAN",
            RequestStatus::UnderReview => "DIPERIKSA",
            RequestStatus::ApprovedStage1 => "DISETUJUI",
            RequestStatus::Suspended => "DITANGGUHKAN",
            RequestStatus::InProgress => "DIPROSES",
            RequestStatus::Fulfilled => "DISELESAIKAN",
            RequestStatus::Confirmed => "DITERIMA",
            RequestStatus::Rejected => "DITOLAK",
        }
    }

    fn english(&self) -> &'static str {
        match self {
            RequestStatus::Submitted => "SUBMITTED",
            RequestStatus::UnderReview => "UNDER_REVIEW",
            RequestStatus::ApprovedStage1 => "APPROVED_STAGE1",
            RequestStatus::Suspended => "SUSPENDED",
            RequestStatus::InProgress => "IN_PROGRESS",
            RequestStatus::Fulfilled => "FULFILLED",
            RequestStatus::Confirmed => "CONFIRMED",
            RequestStatus::Rejected => "REJECTED",
        }
    }

    /// Exact wire value or English alias, case-insensitive.
    pub fn parse(raw: &str) -> Option<RequestStatus> {
        let wanted = raw.trim();
        Self::ALL.into_iter().find(|status| {
            status.as_str().eq_ignore_ascii_case(wanted) || status.english().eq_ignore_ascii_case(wanted)
        })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Rejected | RequestStatus::Confirmed)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "database_kind")]
pub enum DatabaseKind {
    MySQL,
    PostgreSQL,
    Oracle,
    MicrosoftSQLServer,
}

impl DatabaseKind {
    pub fn parse(raw: &str) -> Option<DatabaseKind> {
        match raw.trim() {
            "MySQL" => Some(DatabaseKind::MySQL),
            "PostgreSQL" => Some(DatabaseKind::PostgreSQL),
            "Oracle" => Some(DatabaseKind::Oracle),
            "MicrosoftSQLServer" => Some(DatabaseKind::MicrosoftSQLServer),
            _ => None,
        }
    }
}

/// A server provisioning request (`pengajuan`).
#[derive(Serialize, Deserialize, Debug, Clone, FromRow, ToSchema)]
pub struct ServerRequest {
    pub id: i32,
    #[serde(rename = "pemohonId")]
    pub owner_id: i32,
    #[serde(rename = "nama")]
    pub contact_name: Option<String>,
    #[serde(rename = "jabatan")]
    pub contact_position: Option<String>,
    #[serde(rename = "email")]
    pub contact_email: Option<String>,
    #[serde(rename = "nomorTelepon")]
    pub contact_phone: Option<String>,
    #[serde(rename = "namaSistem")]
    pub system_name: String,
    #[serde(rename = "pemilikSistem")]
    pub system_owner: String,
    #[serde(rename = "penggunaSistem")]
    pub system_users: String,
    #[serde(rename = "fungsiSistem")]
    pub system_purpose: String,
    #[serde(rename = "aksesPublik")]
    pub public_access: bool,
    #[serde(rename = "namaAlamatLayanan")]
    pub service_address: Option<String>,
    pub port: Option<i32>,
    #[serde(rename = "kebutuhanCPU")]
    pub cpu_cores: i32,
    #[serde(rename = "kebutuhanRAM")]
    pub ram_gb: i32,
    #[serde(rename = "kebutuhanGPU")]
    pub gpu: Option<String>,
    #[serde(rename = "kebutuhanStorage")]
    pub storage_gb: i32,
    #[serde(rename = "sistemOperasi")]
    pub operating_system: String,
    #[serde(rename = "softwareTambahan")]
    pub extra_software: Option<String>,
    #[serde(rename = "userSSH")]
    pub ssh_user: Option<String>,
    #[serde(rename = "passwordSSH")]
    pub ssh_password: Option<String>,
    #[serde(rename = "jenisDatabase")]
    pub database_kind: Option<DatabaseKind>,
    #[serde(rename = "userDatabase")]
    pub database_user: Option<String>,
    #[serde(rename = "passwordDatabase")]
    pub database_password: Option<String>,
    pub status: RequestStatus,
    #[serde(rename = "tanggalPengajuan")]
    pub submitted_at: DateTime<Utc>,
}

/// Validated create payload. The owner comes from the session, never the body.
#[derive(Debug, Clone, Default)]
pub struct NewServerRequest {
    pub contact_name: Option<String>,
    pub contact_position: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub system_name: String,
    pub system_owner: String,
    pub system_users: String,
    pub system_purpose: String,
    pub public_access: bool,
    pub service_address: Option<String>,
    pub port: Option<i32>,
    pub cpu_cores: i32,
    pub ram_gb: i32,
    pub gpu: Option<String>,
    pub storage_gb: i32,
    pub operating_system: String,
    pub extra_software: Option<String>,
    pub ssh_user: Option<String>,
    pub ssh_password: Option<String>,
    pub database_kind: Option<DatabaseKind>,
    pub database_user: Option<String>,
    pub database_password: Option<String>,
}

/// `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestChanges {
    pub contact_name: Option<String>,
    pub contact_position: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub system_name: Option<String>,
    pub system_owner: Option<String>,
    pub system_users: Option<String>,
    pub system_purpose: Option<String>,
    pub public_access: Option<bool>,
    pub service_address: Option<String>,
    pub port: Option<i32>,
    pub cpu_cores: Option<i32>,
    pub ram_gb: Option<i32>,
    pub gpu: Option<String>,
    pub storage_gb: Option<i32>,
    pub operating_system: Option<String>,
    pub extra_software: Option<String>,
    pub ssh_user: Option<String>,
    pub ssh_password: Option<String>,
    pub database_kind: Option<DatabaseKind>,
    pub database_user: Option<String>,
    pub database_password: Option<String>,
}

impl RequestChanges {
    pub fn is_empty(&self) -> bool {
        *self == RequestChanges::default()
    }

    pub fn apply(self, request: &mut ServerRequest) {
        if let Some(value) = self.system_name {
            request.system_name = value;
        }
        if let Some(value) = self.system_owner {
            request.system_owner = value;
        }
        if let Some(value) = self.system_users {
            request.system_users = value;
        }
        if let Some(value) = self.system_purpose {
            request.system_purpose = value;
        }
        if let Some(value) = self.public_access {
            request.public_access = value;
        }
        if let Some(value) = self.cpu_cores {
            request.cpu_cores = value;
        }
        if let Some(value) = self.ram_gb {
            request.ram_gb = value;
        }
        if let Some(value) = self.storage_gb {
            request.storage_gb = value;
        }
        if let Some(value) = self.operating_system {
            request.operating_system = value;
        }
        if let Some(value) = self.contact_name {
            request.contact_name = Some(value);
        }
        if let Some(value) = self.contact_position {
            request.contact_position = Some(value);
        }
        if let Some(value) = self.contact_email {
            request.contact_email = Some(value);
        }
        if let Some(value) = self.contact_phone {
            request.contact_phone = Some(value);
        }
        if let Some(value) = self.service_address {
            request.service_address = Some(value);
        }
        if let Some(value) = self.port {
            request.port = Some(value);
        }
        if let Some(value) = self.gpu {
            request.gpu = Some(value);
        }
        if let Some(value) = self.extra_software {
            request.extra_software = Some(value);
        }
        if let Some(value) = self.ssh_user {
            request.ssh_user = Some(value);
        }
        if let Some(value) = self.ssh_password {
            request.ssh_password = Some(value);
        }
        if let Some(value) = self.database_kind {
            request.database_kind = Some(value);
        }
        if let Some(value) = self.database_user {
            request.database_user = Some(value);
        }
        if let Some(value) = self.database_password {
            request.database_password = Some(value);
        }
    }
}

/// Wire body shared by create and update.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RequestInput {
    pub nama: Option<String>,
    pub jabatan: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "nomorTelepon")]
    pub nomor_telepon: Option<String>,
    #[serde(rename = "namaSistem")]
    pub nama_sistem: Option<String>,
    #[serde(rename = "pemilikSistem")]
    pub pemilik_sistem: Option<String>,
    #[serde(rename = "penggunaSistem")]
    pub pengguna_sistem: Option<String>,
    #[serde(rename = "fungsiSistem")]
    pub fungsi_sistem: Option<String>,
    #[serde(rename = "aksesPublik")]
    pub akses_publik: Option<bool>,
    #[serde(rename = "namaAlamatLayanan")]
    pub nama_alamat_layanan: Option<String>,
    #[schema(value_type = Option<i64>)]
    pub port: Option<LenientInt>,
    #[serde(rename = "kebutuhanCPU")]
    #[schema(value_type = Option<i64>)]
    pub kebutuhan_cpu: Option<LenientInt>,
    #[serde(rename = "kebutuhanRAM")]
    #[schema(value_type = Option<i64>)]
    pub kebutuhan_ram: Option<LenientInt>,
    #[serde(rename = "kebutuhanGPU")]
    pub kebutuhan_gpu: Option<String>,
    #[serde(rename = "kebutuhanStorage")]
    #[schema(value_type = Option<i64>)]
    pub kebutuhan_storage: Option<LenientInt>,
    #[serde(rename = "sistemOperasi")]
    pub sistem_operasi: Option<String>,
    #[serde(rename = "softwareTambahan")]
    pub software_tambahan: Option<String>,
    #[serde(rename = "userSSH")]
    pub user_ssh: Option<String>,
    #[serde(rename = "passwordSSH")]
    pub password_ssh: Option<String>,
    #[serde(rename = "jenisDatabase")]
    pub jenis_database: Option<String>,
    #[serde(rename = "userDatabase")]
    pub user_database: Option<String>,
    #[serde(rename = "passwordDatabase")]
    pub password_database: Option<String>,
}

/// Create body for `POST /pengajuan`.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct CreateRequestInput(pub RequestInput);

/// Patch body for `PATCH /pengajuan/{id}`.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct UpdateRequestInput(pub RequestInput);

impl Validate for CreateRequestInput {
    type Output = NewServerRequest;

    fn validate(self) -> Result<NewServerRequest, FieldErrors> {
        let input = self.0;
        let mut errors = FieldErrors::new();

        let system_name = errors.required_text("namaSistem", input.nama_sistem);
        let system_owner = errors.required_text("pemilikSistem", input.pemilik_sistem);
        let system_users = errors.required_text("penggunaSistem", input.pengguna_sistem);
        let system_purpose = errors.required_text("fungsiSistem", input.fungsi_sistem);
        let public_access = input.akses_publik.unwrap_or_else(|| {
            errors.push("aksesPublik", "Required");
            false
        });
        let port = errors.optional_int("port", input.port);
        let cpu_cores = errors.required_int("kebutuhanCPU", input.kebutuhan_cpu);
        let ram_gb = errors.required_int("kebutuhanRAM", input.kebutuhan_ram);
        let storage_gb = errors.required_int("kebutuhanStorage", input.kebutuhan_storage);
        let operating_system = errors.required_text("sistemOperasi", input.sistem_operasi);

        errors.finish(NewServerRequest {
            contact_name: trimmed(input.nama),
            contact_position: trimmed(input.jabatan),
            contact_email: trimmed(input.email),
            contact_phone: trimmed(input.nomor_telepon),
            system_name,
            system_owner,
            system_users,
            system_purpose,
            public_access,
            service_address: trimmed(input.nama_alamat_layanan),
            port,
            cpu_cores,
            ram_gb,
            gpu: trimmed(input.kebutuhan_gpu),
            storage_gb,
            operating_system,
            extra_software: trimmed(input.software_tambahan),
            ssh_user: trimmed(input.user_ssh),
            ssh_password: trimmed(input.password_ssh),
            // Unknown or empty database types are stored as null.
            database_kind: trimmed(input.jenis_database).and_then(|raw| DatabaseKind::parse(&raw)),
            database_user: trimmed(input.user_database),
            database_password: trimmed(input.password_database),
        })
    }
}

impl Validate for UpdateRequestInput {
    type Output = RequestChanges;

    fn validate(self) -> Result<RequestChanges, FieldErrors> {
        let input = self.0;
        let mut errors = FieldErrors::new();

        let contact_name = errors.non_blank("nama", input.nama);
        let contact_email = errors.email("email", input.email, false);
        let system_name = errors.non_blank("namaSistem", input.nama_sistem);
        let system_owner = errors.non_blank("pemilikSistem", input.pemilik_sistem);
        let system_users = errors.non_blank("penggunaSistem", input.pengguna_sistem);
        let system_purpose = errors.non_blank("fungsiSistem", input.fungsi_sistem);
        let port = errors.optional_int("port", input.port);
        let cpu_cores = errors.optional_int("kebutuhanCPU", input.kebutuhan_cpu);
        let ram_gb = errors.optional_int("kebutuhanRAM", input.kebutuhan_ram);
        let storage_gb = errors.optional_int("kebutuhanStorage", input.kebutuhan_storage);
        let operating_system = errors.non_blank("sistemOperasi", input.sistem_operasi);
        let database_kind = trimmed(input.jenis_database).and_then(|raw| {
            let kind = DatabaseKind::parse(&raw);
            if kind.is_none() {
                errors.push("jenisDatabase", "Unknown database type");
            }
            kind
        });

        errors.finish(RequestChanges {
            contact_name,
            contact_position: trimmed(input.jabatan),
            contact_email,
            contact_phone: trimmed(input.nomor_telepon),
            system_name,
            system_owner,
            system_users,
            system_purpose,
            public_access: input.akses_publik,
            service_address: trimmed(input.nama_alamat_layanan),
            port,
            cpu_cores,
            ram_gb,
            gpu: trimmed(input.kebutuhan_gpu),
            storage_gb,
            operating_system,
            extra_software: trimmed(input.software_tambahan),
            ssh_user: trimmed(input.user_ssh),
            ssh_password: trimmed(input.password_ssh),
            database_kind,
            database_user: trimmed(input.user_database),
            database_password: trimmed(input.password_database),
        })
    }
}

/// Row of `GET /pengajuan`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RequestListItem {
    #[serde(flatten)]
    pub request: ServerRequest,
    pub pemohon: Option<UserSummary>,
    pub persetujuan: Vec<ApprovalView>,
}

/// Body of `GET /pengajuan/{id}`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetail {
    #[serde(flatten)]
    pub request: ServerRequest,
    pub pemohon: Option<UserSummary>,
    pub persetujuan: Vec<ApprovalView>,
    pub penerimaan: Option<Acceptance>,
    pub monitoring: Option<Monitoring>,
    pub backup: Option<Backup>,
    pub arsip: Option<Archive>,
    pub tindak_lanjut: Option<FollowUp>,
    pub konfirmasi: Option<Confirmation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create(body: serde_json::Value) -> Result<NewServerRequest, FieldErrors> {
        serde_json::from_value::<CreateRequestInput>(body).unwrap().validate()
    }

    #[test]
    fn create_accepts_numeric_strings_and_nulls_unknown_database() {
        let request = create(json!({
            "namaSistem": "SIAKAD",
            "pemilikSistem": "Fakultas",
            "penggunaSistem": "Mahasiswa",
            "fungsiSistem": "Akademik",
            "aksesPublik": true,
            "kebutuhanCPU": "4",
            "kebutuhanRAM": 8,
            "kebutuhanStorage": "100",
            "sistemOperasi": "Ubuntu 22.04",
            "jenisDatabase": ""
        }))
        .unwrap();

        assert_eq!(request.cpu_cores, 4);
        assert_eq!(request.storage_gb, 100);
        assert_eq!(request.database_kind, None);

        let request = create(json!({
            "namaSistem": "SIAKAD",
            "pemilikSistem": "Fakultas",
            "penggunaSistem": "Mahasiswa",
            "fungsiSistem": "Akademik",
            "aksesPublik": false,
            "kebutuhanCPU": 2,
            "kebutuhanRAM": 4,
            "kebutuhanStorage": 50,
            "sistemOperasi": "Debian",
            "jenisDatabase": "PostgreSQL"
        }))
        .unwrap();
        assert_eq!(request.database_kind, Some(DatabaseKind::PostgreSQL));
    }

    #[test]
    fn create_reports_every_missing_field() {
        let errors = create(json!({ "kebutuhanCPU": -1 })).unwrap_err().into_inner();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "namaSistem",
                "pemilikSistem",
                "penggunaSistem",
                "fungsiSistem",
                "aksesPublik",
                "kebutuhanCPU",
                "kebutuhanRAM",
                "kebutuhanStorage",
                "sistemOperasi",
            ]
        );
    }

    #[test]
    fn empty_patch_is_detected() {
        let changes = serde_json::from_value::<UpdateRequestInput>(json!({}))
            .unwrap()
            .validate()
            .unwrap();
        assert!(changes.is_empty());

        let changes = serde_json::from_value::<UpdateRequestInput>(json!({ "port": 22 }))
            .unwrap()
            .validate()
            .unwrap();
        assert!(!changes.is_empty());
    }

    #[test]
    fn status_parses_wire_and_english_names() {
        assert_eq!(RequestStatus::parse("DISELESAIKAN"), Some(RequestStatus::Fulfilled));
        assert_eq!(RequestStatus::parse("under_review"), Some(RequestStatus::UnderReview));
        assert_eq!(RequestStatus::parse("DONE"), None);
        assert!(RequestStatus::Rejected.is_terminal());
        assert!(RequestStatus::Confirmed.is_terminal());
        assert!(!RequestStatus::Suspended.is_terminal());
    }
}
