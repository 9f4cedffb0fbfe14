use sqlx::PgExecutor;

use crate::db::models::audit::{AuditLog, NewAuditEntry};

pub async fn insert<'e>(db: impl PgExecutor<'e>, entry: &NewAuditEntry) -> Result<AuditLog, sqlx::Error> {
    sqlx::query_as::<_, AuditLog>(
        r#"INSERT INTO audit_logs (request_id, user_id, action, detail)
           VALUES ($1, $2, $3, $4)
           RETURNING *"#,
    )
    .bind(entry.request_id)
    .bind(entry.user_id)
    .bind(&entry.action)
    .bind(&entry.detail)
    .fetch_one(db)
    .await
}

pub async fn list_for_request<'e>(db: impl PgExecutor<'e>, request_id: i32) -> Result<Vec<AuditLog>, sqlx::Error> {
    sqlx::query_as::<_, AuditLog>(
        r#"SELECT * FROM audit_logs
           WHERE request_id = $1
           ORDER BY created_at DESC, id DESC"#,
    )
    .bind(request_id)
    .fetch_all(db)
    .await
}
