use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The six fixed account roles. Stored as the `user_role` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "user_role")]
pub enum Role {
    #[serde(rename = "PEMOHON", alias = "REQUESTER")]
    #[sqlx(rename = "PEMOHON")]
    Requester,
    #[serde(rename = "STAF", alias = "STAFF")]
    #[sqlx(rename = "STAF")]
    Staff,
    #[serde(rename = "KEPALA_LAB", alias = "LAB_HEAD")]
    #[sqlx(rename = "KEPALA_LAB")]
    LabHead,
    #[serde(rename = "WADEK", alias = "VICE_DEAN")]
    #[sqlx(rename = "WADEK")]
    ViceDean,
    #[serde(rename = "DEKAN", alias = "DEAN")]
    #[sqlx(rename = "DEKAN")]
    Dean,
    #[serde(rename = "ADMIN_SERVER", alias = "SERVER_ADMIN")]
    #[sqlx(rename = "ADMIN_SERVER")]
    ServerAdmin,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Requester,
        Role::Staff,
        Role::LabHead,
        Role::ViceDean,
        Role::Dean,
        Role::ServerAdmin,
    ];

    /// Roles allowed to record decisions and override a request's status.
    pub const APPROVERS: [Role; 4] = [Role::LabHead, Role::ViceDean, Role::Dean, Role::ServerAdmin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Requester => "PEMOHON",
            Role::Staff => "STAF",
            Role::LabHead => "KEPALA_LAB",
            Role::ViceDean => "WADEK",
            Role::Dean => "DEKAN",
            Role::ServerAdmin => "ADMIN_SERVER",
        }
    }

    /// Case-insensitive, accepts `-`/space for `_` and the English aliases.
    pub fn parse_loose(raw: &str) -> Option<Role> {
        let normalized = raw.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "PEMOHON" | "REQUESTER" => Some(Role::Requester),
            "STAF" | "STAFF" => Some(Role::Staff),
            "KEPALA_LAB" | "KEPALALAB" | "LAB_HEAD" => Some(Role::LabHead),
            "WADEK" | "VICE_DEAN" => Some(Role::ViceDean),
            "DEKAN" | "DEAN" => Some(Role::Dean),
            "ADMIN_SERVER" | "ADMINSERVER" | "SERVER_ADMIN" => Some(Role::ServerAdmin),
            _ => None,
        }
    }

    pub fn is_approver(&self) -> bool {
        Self::APPROVERS.contains(self)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loose_parsing_accepts_frontend_spellings() {
        assert_eq!(Role::parse_loose("dekan"), Some(Role::Dean));
        assert_eq!(Role::parse_loose("kepala_lab"), Some(Role::LabHead));
        assert_eq!(Role::parse_loose("Kepala Lab"), Some(Role::LabHead));
        assert_eq!(Role::parse_loose("admin-server"), Some(Role::ServerAdmin));
        assert_eq!(Role::parse_loose("superuser"), None);
    }

    #[test]
    fn serializes_wire_value_and_reads_english_alias() {
        assert_eq!(serde_json::to_string(&Role::ViceDean).unwrap(), "\"WADEK\"");
        let parsed: Role = serde_json::from_str("\"VICE_DEAN\"").unwrap();
        assert_eq!(parsed, Role::ViceDean);
    }

    #[test]
    fn every_role_round_trips_through_its_wire_name() {
        for role in Role::ALL {
            assert_eq!(Role::parse_loose(role.as_str()), Some(role));
        }
    }
}
