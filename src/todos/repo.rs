use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Todo {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub text: String,
    pub is_completed: bool,
    // unix milliseconds; present iff is_completed
    pub completed_at: Option<i64>,
    pub created_at: OffsetDateTime,
}

/// Patch applied by `Todo::update`. `None` fields are left untouched.
#[derive(Debug, Default)]
pub struct TodoPatch {
    pub text: Option<String>,
    pub is_completed: Option<bool>,
}

fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

impl Todo {
    pub async fn create(db: &PgPool, owner_id: Uuid, text: &str) -> Result<Todo, AppError> {
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            INSERT INTO todos (owner_id, text)
            VALUES ($1, $2)
            RETURNING id, owner_id, text, is_completed, completed_at, created_at
            "#,
        )
        .bind(owner_id)
        .bind(text)
        .fetch_one(db)
        .await?;
        Ok(todo)
    }

    pub async fn list(db: &PgPool, owner_id: Uuid) -> Result<Vec<Todo>, AppError> {
        let rows = sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, owner_id, text, is_completed, completed_at, created_at
            FROM todos
            WHERE owner_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(owner_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Owner-scoped lookup. `None` covers both "no such todo" and "owned by
    /// someone else"; callers must not distinguish the two.
    pub async fn get(db: &PgPool, owner_id: Uuid, id: Uuid) -> Result<Option<Todo>, AppError> {
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, owner_id, text, is_completed, completed_at, created_at
            FROM todos
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(db)
        .await?;
        Ok(todo)
    }

    /// Apply a patch in a single statement so a concurrent update or delete
    /// on the same row resolves by the store's row atomicity alone.
    ///
    /// Completion drives the timestamp: flipping to true stamps
    /// `completed_at` (keeping an existing stamp), flipping to false clears
    /// it, and an omitted flag touches neither.
    pub async fn update(
        db: &PgPool,
        owner_id: Uuid,
        id: Uuid,
        patch: TodoPatch,
    ) -> Result<Option<Todo>, AppError> {
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            UPDATE todos
            SET text = COALESCE($3::text, text),
                is_completed = COALESCE($4::boolean, is_completed),
                completed_at = CASE
                    WHEN $4::boolean IS NULL THEN completed_at
                    WHEN $4::boolean THEN COALESCE(completed_at, $5::bigint)
                    ELSE NULL
                END
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, text, is_completed, completed_at, created_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(patch.text)
        .bind(patch.is_completed)
        .bind(now_millis())
        .fetch_optional(db)
        .await?;
        Ok(todo)
    }

    /// Owner-scoped delete; returns the removed row's snapshot.
    pub async fn delete(db: &PgPool, owner_id: Uuid, id: Uuid) -> Result<Option<Todo>, AppError> {
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            DELETE FROM todos
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, text, is_completed, completed_at, created_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(db)
        .await?;
        Ok(todo)
    }
}
