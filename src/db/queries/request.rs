use sqlx::PgExecutor;

use crate::db::models::request::{NewServerRequest, RequestChanges, RequestStatus, ServerRequest};

pub async fn insert<'e>(
    db: impl PgExecutor<'e>,
    owner_id: i32,
    request: &NewServerRequest,
) -> Result<ServerRequest, sqlx::Error> {
    sqlx::query_as::<_, ServerRequest>(
        r#"INSERT INTO server_requests (
               owner_id, contact_name, contact_position, contact_email, contact_phone,
               system_name, system_owner, system_users, system_purpose, public_access,
               service_address, port, cpu_cores, ram_gb, gpu, storage_gb, operating_system,
               extra_software, ssh_user, ssh_password, database_kind, database_user,
               database_password, status
           )
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                   $18, $19, $20, $21, $22, $23, 'DIAJUKAN')
           RETURNING *"#,
    )
    .bind(owner_id)
    .bind(&request.contact_name)
    .bind(&request.contact_position)
    .bind(&request.contact_email)
    .bind(&request.contact_phone)
    .bind(&request.system_name)
    .bind(&request.system_owner)
    .bind(&request.system_users)
    .bind(&request.system_purpose)
    .bind(request.public_access)
    .bind(&request.service_address)
    .bind(request.port)
    .bind(request.cpu_cores)
    .bind(request.ram_gb)
    .bind(&request.gpu)
    .bind(request.storage_gb)
    .bind(&request.operating_system)
    .bind(&request.extra_software)
    .bind(&request.ssh_user)
    .bind(&request.ssh_password)
    .bind(request.database_kind)
    .bind(&request.database_user)
    .bind(&request.database_password)
    .fetch_one(db)
    .await
}

pub async fn find_by_id<'e>(db: impl PgExecutor<'e>, id: i32) -> Result<Option<ServerRequest>, sqlx::Error> {
    sqlx::query_as::<_, ServerRequest>("SELECT * FROM server_requests WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn list<'e>(db: impl PgExecutor<'e>, owner_id: Option<i32>) -> Result<Vec<ServerRequest>, sqlx::Error> {
    sqlx::query_as::<_, ServerRequest>(
        r#"SELECT * FROM server_requests
           WHERE $1::int IS NULL OR owner_id = $1
           ORDER BY submitted_at DESC, id DESC"#,
    )
    .bind(owner_id)
    .fetch_all(db)
    .await
}

/// Absent fields keep their stored value.
pub async fn update<'e>(
    db: impl PgExecutor<'e>,
    id: i32,
    changes: &RequestChanges,
) -> Result<Option<ServerRequest>, sqlx::Error> {
    sqlx::query_as::<_, ServerRequest>(
        r#"UPDATE server_requests SET
               contact_name      = COALESCE($2, contact_name),
               contact_position  = COALESCE($3, contact_position),
               contact_email     = COALESCE($4, contact_email),
               contact_phone     = COALESCE($5, contact_phone),
               system_name       = COALESCE($6, system_name),
               system_owner      = COALESCE($7, system_owner),
               system_users      = COALESCE($8, system_users),
               system_purpose    = COALESCE($9, system_purpose),
               public_access     = COALESCE($10, public_access),
               service_address   = COALESCE($11, service_address),
               port              = COALESCE($12, port),
               cpu_cores         = COALESCE($13, cpu_cores),
               ram_gb            = COALESCE($14, ram_gb),
               gpu               = COALESCE($15, gpu),
               storage_gb        = COALESCE($16, storage_gb),
               operating_system  = COALESCE($17, operating_system),
               extra_software    = COALESCE($18, extra_software),
               ssh_user          = COALESCE($19, ssh_user),
               ssh_password      = COALESCE($20, ssh_password),
               database_kind     = COALESCE($21, database_kind),
               database_user     = COALESCE($22, database_user),
               database_password = COALESCE($23, database_password)
           WHERE id = $1
           RETURNING *"#,
    )
    .bind(id)
    .bind(&changes.contact_name)
    .bind(&changes.contact_position)
    .bind(&changes.contact_email)
    .bind(&changes.contact_phone)
    .bind(&changes.system_name)
    .bind(&changes.system_owner)
    .bind(&changes.system_users)
    .bind(&changes.system_purpose)
    .bind(changes.public_access)
    .bind(&changes.service_address)
    .bind(changes.port)
    .bind(changes.cpu_cores)
    .bind(changes.ram_gb)
    .bind(&changes.gpu)
    .bind(changes.storage_gb)
    .bind(&changes.operating_system)
    .bind(&changes.extra_software)
    .bind(&changes.ssh_user)
    .bind(&changes.ssh_password)
    .bind(changes.database_kind)
    .bind(&changes.database_user)
    .bind(&changes.database_password)
    .fetch_optional(db)
    .await
}

/// Current status, with the row locked until the surrounding transaction ends.
pub async fn lock_status<'e>(db: impl PgExecutor<'e>, id: i32) -> Result<Option<RequestStatus>, sqlx::Error> {
    sqlx::query_scalar::<_, RequestStatus>("SELECT status FROM server_requests WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn set_status<'e>(
    db: impl PgExecutor<'e>,
    id: i32,
    status: RequestStatus,
) -> Result<Option<ServerRequest>, sqlx::Error> {
    sqlx::query_as::<_, ServerRequest>("UPDATE server_requests SET status = $2 WHERE id = $1 RETURNING *")
        .bind(id)
        .bind(status)
        .fetch_optional(db)
        .await
}

/// Sub-records, approvals and audit rows go with it (`ON DELETE CASCADE`).
pub async fn delete<'e>(db: impl PgExecutor<'e>, id: i32) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM server_requests WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
