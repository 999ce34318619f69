use chrono::{Duration, SecondsFormat, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::models::UserRow;
use crate::store::now_text;

/// Sessions older than this are ignored and the cookie expires with them.
pub const SESSION_TTL_DAYS: i64 = 30;

fn cutoff_text() -> String {
    (Utc::now() - Duration::days(SESSION_TTL_DAYS)).to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Opens a session for `user_id` and returns its token. Expired sessions
/// are pruned first.
pub async fn create(pool: &SqlitePool, user_id: i64) -> sqlx::Result<String> {
    let pruned = delete_expired(pool).await?;
    if pruned > 0 {
        debug!("Pruned {pruned} expired sessions");
    }

    let token = Uuid::new_v4().simple().to_string();
    sqlx::query("INSERT INTO sessions (token, user_id, created_at) VALUES (?, ?, ?)")
        .bind(&token)
        .bind(user_id)
        .bind(now_text())
        .execute(pool)
        .await?;
    Ok(token)
}

/// The user behind a live session token.
pub async fn find_user(pool: &SqlitePool, token: &str) -> sqlx::Result<Option<UserRow>> {
    sqlx::query_as(
        "SELECT u.id, u.email, u.password_hash, u.name, u.created_at \
         FROM sessions s JOIN users u ON u.id = s.user_id \
         WHERE s.token = ? AND datetime(s.created_at) > datetime(?)",
    )
    .bind(token)
    .bind(cutoff_text())
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &SqlitePool, token: &str) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

/// Removes sessions past their TTL. Returns how many were deleted.
pub async fn delete_expired(pool: &SqlitePool) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE datetime(created_at) <= datetime(?)")
        .bind(cutoff_text())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::store::users;

    #[tokio::test]
    async fn test_session_lifecycle() {
        let pool = test_pool().await;
        let user = users::create(&pool, "a@example.com", "hash", None).await.unwrap();

        let token = create(&pool, user.id).await.unwrap();
        assert_eq!(token.len(), 32);

        let found = find_user(&pool, &token).await.unwrap().unwrap();
        assert_eq!(found.email, "a@example.com");

        delete(&pool, &token).await.unwrap();
        assert!(find_user(&pool, &token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_ignored() {
        let pool = test_pool().await;
        let user = users::create(&pool, "a@example.com", "hash", None).await.unwrap();
        let stale = (Utc::now() - Duration::days(SESSION_TTL_DAYS + 1))
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        sqlx::query("INSERT INTO sessions (token, user_id, created_at) VALUES ('old', ?, ?)")
            .bind(user.id)
            .bind(stale)
            .execute(&pool)
            .await
            .unwrap();

        assert!(find_user(&pool, "old").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_new_session_prunes_expired_rows() {
        let pool = test_pool().await;
        let user = users::create(&pool, "a@example.com", "hash", None).await.unwrap();
        let stale = (Utc::now() - Duration::days(SESSION_TTL_DAYS + 1))
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        sqlx::query("INSERT INTO sessions (token, user_id, created_at) VALUES ('old', ?, ?)")
            .bind(user.id)
            .bind(stale)
            .execute(&pool)
            .await
            .unwrap();

        let fresh = create(&pool, user.id).await.unwrap();

        let tokens: Vec<String> = sqlx::query_scalar("SELECT token FROM sessions")
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_eq!(tokens, vec![fresh]);
        assert_eq!(delete_expired(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let pool = test_pool().await;
        assert!(find_user(&pool, "nope").await.unwrap().is_none());
    }
}
