use sqlx::PgExecutor;

use crate::db::models::role::Role;
use crate::db::models::user::{NewUser, User, UserChanges};

pub async fn find_by_id<'e>(db: impl PgExecutor<'e>, id: i32) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn find_by_email<'e>(db: impl PgExecutor<'e>, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = lower($1)")
        .bind(email)
        .fetch_optional(db)
        .await
}

pub async fn list<'e>(db: impl PgExecutor<'e>, role: Option<Role>) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"SELECT * FROM users
           WHERE $1::user_role IS NULL OR role = $1
           ORDER BY created_at DESC, id DESC"#,
    )
    .bind(role)
    .fetch_all(db)
    .await
}

pub async fn insert<'e>(db: impl PgExecutor<'e>, user: &NewUser) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"INSERT INTO users (name, email, password_hash, phone, role)
           VALUES ($1, $2, $3, $4, $5)
           RETURNING *"#,
    )
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.phone)
    .bind(user.role)
    .fetch_one(db)
    .await
}

pub async fn update<'e>(
    db: impl PgExecutor<'e>,
    id: i32,
    changes: &UserChanges,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"UPDATE users SET name = $2, email = $3, phone = $4
           WHERE id = $1
           RETURNING *"#,
    )
    .bind(id)
    .bind(&changes.name)
    .bind(&changes.email)
    .bind(&changes.phone)
    .fetch_optional(db)
    .await
}

pub async fn delete<'e>(db: impl PgExecutor<'e>, id: i32) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
