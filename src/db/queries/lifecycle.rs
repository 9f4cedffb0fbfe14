use sqlx::PgExecutor;

use crate::db::models::lifecycle::{
    Acceptance, AcceptanceChanges, Archive, ArchiveNote, Backup, BackupChanges, Confirmation,
    ConfirmationFields, FollowUp, FollowUpChanges, Monitoring, MonitoringFields, NewAcceptance,
    NewBackup, NewFollowUp, RecordKind,
};

pub async fn find_acceptance<'e>(db: impl PgExecutor<'e>, request_id: i32) -> Result<Option<Acceptance>, sqlx::Error> {
    sqlx::query_as::<_, Acceptance>("SELECT * FROM acceptances WHERE request_id = $1")
        .bind(request_id)
        .fetch_optional(db)
        .await
}

pub async fn insert_acceptance<'e>(
    db: impl PgExecutor<'e>,
    request_id: i32,
    record: &NewAcceptance,
) -> Result<Acceptance, sqlx::Error> {
    sqlx::query_as::<_, Acceptance>(
        r#"INSERT INTO acceptances (request_id, cpu_cores, ram_gb, storage_gb, operating_system, extra_software)
           VALUES ($1, $2, $3, $4, $5, $6)
           RETURNING *"#,
    )
    .bind(request_id)
    .bind(record.cpu_cores)
    .bind(record.ram_gb)
    .bind(record.storage_gb)
    .bind(&record.operating_system)
    .bind(&record.extra_software)
    .fetch_one(db)
    .await
}

pub async fn update_acceptance<'e>(
    db: impl PgExecutor<'e>,
    request_id: i32,
    changes: &AcceptanceChanges,
) -> Result<Option<Acceptance>, sqlx::Error> {
    sqlx::query_as::<_, Acceptance>(
        r#"UPDATE acceptances SET
               cpu_cores        = COALESCE($2, cpu_cores),
               ram_gb           = COALESCE($3, ram_gb),
               storage_gb       = COALESCE($4, storage_gb),
               operating_system = COALESCE($5, operating_system),
               extra_software   = COALESCE($6, extra_software)
           WHERE request_id = $1
           RETURNING *"#,
    )
    .bind(request_id)
    .bind(changes.cpu_cores)
    .bind(changes.ram_gb)
    .bind(changes.storage_gb)
    .bind(&changes.operating_system)
    .bind(&changes.extra_software)
    .fetch_optional(db)
    .await
}

pub async fn find_monitoring<'e>(db: impl PgExecutor<'e>, request_id: i32) -> Result<Option<Monitoring>, sqlx::Error> {
    sqlx::query_as::<_, Monitoring>("SELECT * FROM monitorings WHERE request_id = $1")
        .bind(request_id)
        .fetch_optional(db)
        .await
}

pub async fn insert_monitoring<'e>(
    db: impl PgExecutor<'e>,
    request_id: i32,
    record: &MonitoringFields,
) -> Result<Monitoring, sqlx::Error> {
    sqlx::query_as::<_, Monitoring>(
        r#"INSERT INTO monitorings (request_id, ip_address, host, state, uptime)
           VALUES ($1, $2, $3, $4, $5)
           RETURNING *"#,
    )
    .bind(request_id)
    .bind(&record.ip_address)
    .bind(&record.host)
    .bind(&record.state)
    .bind(&record.uptime)
    .fetch_one(db)
    .await
}

pub async fn update_monitoring<'e>(
    db: impl PgExecutor<'e>,
    request_id: i32,
    changes: &MonitoringFields,
) -> Result<Option<Monitoring>, sqlx::Error> {
    sqlx::query_as::<_, Monitoring>(
        r#"UPDATE monitorings SET
               ip_address = COALESCE($2, ip_address),
               host       = COALESCE($3, host),
               state      = COALESCE($4, state),
               uptime     = COALESCE($5, uptime)
           WHERE request_id = $1
           RETURNING *"#,
    )
    .bind(request_id)
    .bind(&changes.ip_address)
    .bind(&changes.host)
    .bind(&changes.state)
    .bind(&changes.uptime)
    .fetch_optional(db)
    .await
}

pub async fn find_backup<'e>(db: impl PgExecutor<'e>, request_id: i32) -> Result<Option<Backup>, sqlx::Error> {
    sqlx::query_as::<_, Backup>("SELECT * FROM backups WHERE request_id = $1")
        .bind(request_id)
        .fetch_optional(db)
        .await
}

pub async fn insert_backup<'e>(db: impl PgExecutor<'e>, request_id: i32, record: &NewBackup) -> Result<Backup, sqlx::Error> {
    sqlx::query_as::<_, Backup>(
        r#"INSERT INTO backups (request_id, period, last_run)
           VALUES ($1, $2, $3)
           RETURNING *"#,
    )
    .bind(request_id)
    .bind(&record.period)
    .bind(record.last_run)
    .fetch_one(db)
    .await
}

pub async fn update_backup<'e>(
    db: impl PgExecutor<'e>,
    request_id: i32,
    changes: &BackupChanges,
) -> Result<Option<Backup>, sqlx::Error> {
    sqlx::query_as::<_, Backup>(
        r#"UPDATE backups SET
               period   = COALESCE($2, period),
               last_run = COALESCE($3, last_run)
           WHERE request_id = $1
           RETURNING *"#,
    )
    .bind(request_id)
    .bind(&changes.period)
    .bind(changes.last_run)
    .fetch_optional(db)
    .await
}

pub async fn find_archive<'e>(db: impl PgExecutor<'e>, request_id: i32) -> Result<Option<Archive>, sqlx::Error> {
    sqlx::query_as::<_, Archive>("SELECT * FROM archives WHERE request_id = $1")
        .bind(request_id)
        .fetch_optional(db)
        .await
}

pub async fn insert_archive<'e>(db: impl PgExecutor<'e>, request_id: i32, record: &ArchiveNote) -> Result<Archive, sqlx::Error> {
    sqlx::query_as::<_, Archive>("INSERT INTO archives (request_id, note) VALUES ($1, $2) RETURNING *")
        .bind(request_id)
        .bind(&record.note)
        .fetch_one(db)
        .await
}

pub async fn update_archive<'e>(
    db: impl PgExecutor<'e>,
    request_id: i32,
    changes: &ArchiveNote,
) -> Result<Option<Archive>, sqlx::Error> {
    sqlx::query_as::<_, Archive>(
        "UPDATE archives SET note = COALESCE($2, note) WHERE request_id = $1 RETURNING *",
    )
    .bind(request_id)
    .bind(&changes.note)
    .fetch_optional(db)
    .await
}

pub async fn find_follow_up<'e>(db: impl PgExecutor<'e>, request_id: i32) -> Result<Option<FollowUp>, sqlx::Error> {
    sqlx::query_as::<_, FollowUp>("SELECT * FROM follow_ups WHERE request_id = $1")
        .bind(request_id)
        .fetch_optional(db)
        .await
}

pub async fn insert_follow_up<'e>(
    db: impl PgExecutor<'e>,
    request_id: i32,
    record: &NewFollowUp,
) -> Result<FollowUp, sqlx::Error> {
    sqlx::query_as::<_, FollowUp>(
        r#"INSERT INTO follow_ups (request_id, description, starts_on, ends_on)
           VALUES ($1, $2, $3, $4)
           RETURNING *"#,
    )
    .bind(request_id)
    .bind(&record.description)
    .bind(record.starts_on)
    .bind(record.ends_on)
    .fetch_one(db)
    .await
}

pub async fn update_follow_up<'e>(
    db: impl PgExecutor<'e>,
    request_id: i32,
    changes: &FollowUpChanges,
) -> Result<Option<FollowUp>, sqlx::Error> {
    sqlx::query_as::<_, FollowUp>(
        r#"UPDATE follow_ups SET
               description = COALESCE($2, description),
               starts_on   = COALESCE($3, starts_on),
               ends_on     = COALESCE($4, ends_on)
           WHERE request_id = $1
           RETURNING *"#,
    )
    .bind(request_id)
    .bind(&changes.description)
    .bind(changes.starts_on)
    .bind(changes.ends_on)
    .fetch_optional(db)
    .await
}

pub async fn find_confirmation<'e>(db: impl PgExecutor<'e>, request_id: i32) -> Result<Option<Confirmation>, sqlx::Error> {
    sqlx::query_as::<_, Confirmation>("SELECT * FROM confirmations WHERE request_id = $1")
        .bind(request_id)
        .fetch_optional(db)
        .await
}

pub async fn insert_confirmation<'e>(
    db: impl PgExecutor<'e>,
    request_id: i32,
    user_id: i32,
    record: &ConfirmationFields,
) -> Result<Confirmation, sqlx::Error> {
    sqlx::query_as::<_, Confirmation>(
        r#"INSERT INTO confirmations (request_id, user_id, state, note)
           VALUES ($1, $2, $3, $4)
           RETURNING *"#,
    )
    .bind(request_id)
    .bind(user_id)
    .bind(&record.state)
    .bind(&record.note)
    .fetch_one(db)
    .await
}

pub async fn update_confirmation<'e>(
    db: impl PgExecutor<'e>,
    request_id: i32,
    changes: &ConfirmationFields,
) -> Result<Option<Confirmation>, sqlx::Error> {
    sqlx::query_as::<_, Confirmation>(
        r#"UPDATE confirmations SET
               state = $2,
               note  = COALESCE($3, note)
           WHERE request_id = $1
           RETURNING *"#,
    )
    .bind(request_id)
    .bind(&changes.state)
    .bind(&changes.note)
    .fetch_optional(db)
    .await
}

pub async fn delete<'e>(db: impl PgExecutor<'e>, kind: RecordKind, request_id: i32) -> Result<bool, sqlx::Error> {
    // Table names come from a closed enum, never from input.
    let statement = format!("DELETE FROM {} WHERE request_id = $1", kind.table());
    let result = sqlx::query(&statement).bind(request_id).execute(db).await?;
    Ok(result.rows_affected() > 0)
}
