use sqlx::PgExecutor;

use crate::db::models::approval::{Approval, NewApproval};
use crate::db::models::role::Role;

pub async fn list<'e>(db: impl PgExecutor<'e>, request_id: Option<i32>) -> Result<Vec<Approval>, sqlx::Error> {
    sqlx::query_as::<_, Approval>(
        r#"SELECT * FROM approvals
           WHERE $1::int IS NULL OR request_id = $1
           ORDER BY decided_at DESC, id DESC"#,
    )
    .bind(request_id)
    .fetch_all(db)
    .await
}

pub async fn find_by_role<'e>(
    db: impl PgExecutor<'e>,
    request_id: i32,
    role: Role,
) -> Result<Option<Approval>, sqlx::Error> {
    sqlx::query_as::<_, Approval>("SELECT * FROM approvals WHERE request_id = $1 AND decider_role = $2")
        .bind(request_id)
        .bind(role)
        .fetch_optional(db)
        .await
}

/// Fails with a unique violation when the role already decided on the request.
pub async fn insert<'e>(db: impl PgExecutor<'e>, approval: &NewApproval) -> Result<Approval, sqlx::Error> {
    sqlx::query_as::<_, Approval>(
        r#"INSERT INTO approvals (request_id, user_id, decider_role, decision, note)
           VALUES ($1, $2, $3, $4, $5)
           RETURNING *"#,
    )
    .bind(approval.request_id)
    .bind(approval.user_id)
    .bind(approval.decider_role)
    .bind(approval.decision)
    .bind(&approval.note)
    .fetch_one(db)
    .await
}

pub async fn delete<'e>(db: impl PgExecutor<'e>, id: i32) -> Result<Option<Approval>, sqlx::Error> {
    sqlx::query_as::<_, Approval>("DELETE FROM approvals WHERE id = $1 RETURNING *")
        .bind(id)
        .fetch_optional(db)
        .await
}
