use sqlx::SqlitePool;

use crate::models::UserRow;
use crate::store::now_text;

const COLUMNS: &str = "id, email, password_hash, name, created_at";

/// Inserts a user. A duplicate email surfaces as a unique-constraint
/// violation from the database.
pub async fn create(
    pool: &SqlitePool,
    email: &str,
    password_hash: &str,
    name: Option<&str>,
) -> sqlx::Result<UserRow> {
    sqlx::query_as(&format!(
        "INSERT INTO users (email, password_hash, name, created_at) VALUES (?, ?, ?, ?) \
         RETURNING {COLUMNS}"
    ))
    .bind(email)
    .bind(password_hash)
    .bind(name)
    .bind(now_text())
    .fetch_one(pool)
    .await
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> sqlx::Result<Option<UserRow>> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM users WHERE email = ?"))
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn get(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<UserRow>> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
}
