//! The approval chain: which status a decision leads to, who may decide, and the
//! administrative status override.

pub mod decision;
pub mod transition;

use thiserror::Error;

use crate::db::models::role::Role;
use crate::db::store::StoreError;

pub use decision::{override_status, submit_decision, DecisionOutcome};
pub use transition::{next_status, OVERRIDE_STATUSES};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Role {0} may not perform this action.")]
    RoleNotAllowed(Role),
    #[error("Pengajuan {0} not found.")]
    RequestNotFound(i32),
    #[error("Role {role} has already decided on pengajuan {request_id}.")]
    DuplicateDecision { request_id: i32, role: Role },
    #[error("Status '{0}' is not allowed.")]
    StatusNotAllowed(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}
