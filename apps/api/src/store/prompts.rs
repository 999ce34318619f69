use sqlx::SqlitePool;

use crate::models::PromptRow;
use crate::store::now_text;

const COLUMNS: &str = "id, user_id, title, content, created_at";

/// Prompts owned by `user_id`, newest first. `datetime()` normalizes rows
/// written with the schema default alongside RFC3339 ones.
pub async fn list_for_user(pool: &SqlitePool, user_id: i64) -> sqlx::Result<Vec<PromptRow>> {
    sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM prompts WHERE user_id = ? ORDER BY datetime(created_at) DESC, id DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn get(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<PromptRow>> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM prompts WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Loads a prompt visible to `viewer`: anonymous prompts are visible to
/// everyone, owned prompts only to their owner.
pub async fn get_visible(
    pool: &SqlitePool,
    id: i64,
    viewer: Option<i64>,
) -> sqlx::Result<Option<PromptRow>> {
    Ok(get(pool, id)
        .await?
        .filter(|row| row.user_id.is_none() || row.user_id == viewer))
}

pub async fn create(
    pool: &SqlitePool,
    user_id: Option<i64>,
    title: &str,
    content: &str,
) -> sqlx::Result<PromptRow> {
    sqlx::query_as(&format!(
        "INSERT INTO prompts (user_id, title, content, created_at) VALUES (?, ?, ?, ?) \
         RETURNING {COLUMNS}"
    ))
    .bind(user_id)
    .bind(title)
    .bind(content)
    .bind(now_text())
    .fetch_one(pool)
    .await
}

/// A prompt of `user_id` with exactly this content, if any.
pub async fn find_by_content(
    pool: &SqlitePool,
    user_id: i64,
    content: &str,
) -> sqlx::Result<Option<PromptRow>> {
    sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM prompts WHERE user_id = ? AND content = ? ORDER BY id LIMIT 1"
    ))
    .bind(user_id)
    .bind(content)
    .fetch_optional(pool)
    .await
}

/// Deletes by id. Returns `false` when no row was removed.
pub async fn delete(pool: &SqlitePool, id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM prompts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::store::users;

    #[tokio::test]
    async fn test_create_and_get() {
        let pool = test_pool().await;
        let created = create(&pool, None, "Черновик", "Действуй как...").await.unwrap();
        assert!(created.id > 0);
        assert_eq!(created.user_id, None);

        let loaded = get(&pool, created.id).await.unwrap().unwrap();
        assert_eq!(loaded.title, "Черновик");
        assert_eq!(loaded.content, "Действуй как...");
        assert_eq!(loaded.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_user_scoped() {
        let pool = test_pool().await;
        let alice = users::create(&pool, "alice@example.com", "hash", None).await.unwrap();
        let bob = users::create(&pool, "bob@example.com", "hash", None).await.unwrap();

        let first = create(&pool, Some(alice.id), "a", "1").await.unwrap();
        let second = create(&pool, Some(alice.id), "b", "2").await.unwrap();
        create(&pool, Some(bob.id), "c", "3").await.unwrap();
        create(&pool, None, "d", "4").await.unwrap();

        let ids: Vec<i64> = list_for_user(&pool, alice.id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    async fn insert_at(pool: &SqlitePool, user_id: i64, created_at: &str) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO prompts (user_id, title, content, created_at) \
             VALUES (?, 't', 'c', ?) RETURNING id",
        )
        .bind(user_id)
        .bind(created_at)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_list_orders_mixed_timestamp_formats_chronologically() {
        let pool = test_pool().await;
        let alice = users::create(&pool, "alice@example.com", "hash", None).await.unwrap();
        let later = insert_at(&pool, alice.id, "2025-03-01 12:00:00").await;
        let earlier = insert_at(&pool, alice.id, "2025-03-01T09:00:00.000Z").await;

        let ids: Vec<i64> = list_for_user(&pool, alice.id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![later, earlier]);
    }

    #[tokio::test]
    async fn test_foreign_prompt_is_not_visible() {
        let pool = test_pool().await;
        let alice = users::create(&pool, "alice@example.com", "hash", None).await.unwrap();
        let owned = create(&pool, Some(alice.id), "a", "1").await.unwrap();
        let shared = create(&pool, None, "b", "2").await.unwrap();

        assert!(get_visible(&pool, owned.id, None).await.unwrap().is_none());
        assert!(get_visible(&pool, owned.id, Some(alice.id + 1)).await.unwrap().is_none());
        assert!(get_visible(&pool, owned.id, Some(alice.id)).await.unwrap().is_some());
        assert!(get_visible(&pool, shared.id, None).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_find_by_content() {
        let pool = test_pool().await;
        let alice = users::create(&pool, "alice@example.com", "hash", None).await.unwrap();
        let saved = create(&pool, Some(alice.id), "a", "same").await.unwrap();

        let found = find_by_content(&pool, alice.id, "same").await.unwrap().unwrap();
        assert_eq!(found.id, saved.id);
        assert!(find_by_content(&pool, alice.id, "other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_reports_missing_rows() {
        let pool = test_pool().await;
        let created = create(&pool, None, "a", "1").await.unwrap();
        assert!(delete(&pool, created.id).await.unwrap());
        assert!(!delete(&pool, created.id).await.unwrap());
        assert!(get(&pool, created.id).await.unwrap().is_none());
    }
}
