use crate::db::models::approval::Decision;
use crate::db::models::lifecycle::RecordKind;
use crate::db::models::request::RequestStatus;
use crate::db::models::role::Role;
use crate::workflow::WorkflowError;

/// Statuses an approver may set directly, from any current status.
pub const OVERRIDE_STATUSES: [RequestStatus; 6] = [
    RequestStatus::Submitted,
    RequestStatus::UnderReview,
    RequestStatus::ApprovedStage1,
    RequestStatus::Suspended,
    RequestStatus::InProgress,
    RequestStatus::Fulfilled,
];

/// Status a request moves to after `role` records `decision` on it.
///
/// A rejection always lands on `Rejected`. An approval on a terminal request changes nothing,
/// otherwise it advances by role; roles outside the chain leave the status as is.
pub fn next_status(current: RequestStatus, role: Role, decision: Decision) -> RequestStatus {
    if decision == Decision::Rejected {
        return RequestStatus::Rejected;
    }
    if current.is_terminal() {
        return current;
    }
    match role {
        Role::LabHead => RequestStatus::UnderReview,
        Role::ViceDean => RequestStatus::ApprovedStage1,
        Role::Dean => RequestStatus::InProgress,
        Role::ServerAdmin | Role::Staff | Role::Requester => current,
    }
}

pub fn parse_override_status(raw: &str) -> Result<RequestStatus, WorkflowError> {
    RequestStatus::parse(raw)
        .filter(|status| OVERRIDE_STATUSES.contains(status))
        .ok_or_else(|| WorkflowError::StatusNotAllowed(raw.trim().to_string()))
}

/// Status a request takes when a sub-record of `kind` is created, if any.
pub fn status_after_create(kind: RecordKind) -> Option<RequestStatus> {
    match kind {
        RecordKind::Acceptance => Some(RequestStatus::Fulfilled),
        RecordKind::FollowUp => Some(RequestStatus::InProgress),
        RecordKind::Confirmation => Some(RequestStatus::Confirmed),
        RecordKind::Monitoring | RecordKind::Backup | RecordKind::Archive => None,
    }
}

/// The requester can only confirm a request that was handed over.
pub fn can_confirm(current: RequestStatus) -> bool {
    current == RequestStatus::Fulfilled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approvals_advance_by_role() {
        let s = RequestStatus::Submitted;
        assert_eq!(next_status(s, Role::LabHead, Decision::Approved), RequestStatus::UnderReview);
        assert_eq!(
            next_status(RequestStatus::UnderReview, Role::ViceDean, Decision::Approved),
            RequestStatus::ApprovedStage1
        );
        assert_eq!(
            next_status(RequestStatus::ApprovedStage1, Role::Dean, Decision::Approved),
            RequestStatus::InProgress
        );
    }

    #[test]
    fn rejection_is_terminal_from_every_status_and_role() {
        for current in RequestStatus::ALL {
            for role in Role::ALL {
                assert_eq!(next_status(current, role, Decision::Rejected), RequestStatus::Rejected);
            }
        }
    }

    #[test]
    fn unmapped_roles_leave_status_unchanged() {
        for role in [Role::ServerAdmin, Role::Staff, Role::Requester] {
            assert_eq!(
                next_status(RequestStatus::ApprovedStage1, role, Decision::Approved),
                RequestStatus::ApprovedStage1
            );
        }
    }

    #[test]
    fn approvals_do_not_revive_terminal_requests() {
        assert_eq!(
            next_status(RequestStatus::Rejected, Role::Dean, Decision::Approved),
            RequestStatus::Rejected
        );
        assert_eq!(
            next_status(RequestStatus::Confirmed, Role::LabHead, Decision::Approved),
            RequestStatus::Confirmed
        );
    }

    #[test]
    fn override_allow_list_excludes_terminal_statuses() {
        assert_eq!(parse_override_status("DISELESAIKAN").unwrap(), RequestStatus::Fulfilled);
        assert_eq!(parse_override_status("suspended").unwrap(), RequestStatus::Suspended);
        assert!(matches!(
            parse_override_status("DITOLAK"),
            Err(WorkflowError::StatusNotAllowed(s)) if s == "DITOLAK"
        ));
        assert!(parse_override_status("DITERIMA").is_err());
        assert!(parse_override_status("").is_err());
    }

    #[test]
    fn lifecycle_side_effects() {
        assert_eq!(status_after_create(RecordKind::Acceptance), Some(RequestStatus::Fulfilled));
        assert_eq!(status_after_create(RecordKind::FollowUp), Some(RequestStatus::InProgress));
        assert_eq!(status_after_create(RecordKind::Backup), None);
        assert!(can_confirm(RequestStatus::Fulfilled));
        assert!(!can_confirm(RequestStatus::InProgress));
    }
}
