use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

/// One live token. Rows are the user's session set; deleting a row revokes
/// the token regardless of its signature still verifying.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Session {
    pub id: i64,
    pub user_id: Uuid,
    pub token: String,
    pub created_at: OffsetDateTime,
}

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user with hashed password. A duplicate email is detected
    /// by the unique constraint, never by a pre-check.
    pub async fn create(db: &PgPool, email: &str, password_hash: &str) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::DuplicateEmail
            }
            _ => AppError::from(e),
        })?;
        Ok(user)
    }
}

impl Session {
    /// Append a token to the user's session set.
    pub async fn insert(db: &PgPool, user_id: Uuid, token: &str) -> Result<Session, AppError> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (user_id, token)
            VALUES ($1, $2)
            RETURNING id, user_id, token, created_at
            "#,
        )
        .bind(user_id)
        .bind(token)
        .fetch_one(db)
        .await?;
        Ok(session)
    }

    /// Resolve a presented token to its user. Both conditions matter: the
    /// exact token string must still be in the set AND belong to the user
    /// the signature named.
    pub async fn find_user(
        db: &PgPool,
        token: &str,
        user_id: Uuid,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.email, u.password_hash, u.created_at
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token = $1 AND s.user_id = $2
            "#,
        )
        .bind(token)
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Remove exactly this token from the user's session set; other tokens
    /// for the same user keep authenticating.
    pub async fn revoke(db: &PgPool, user_id: Uuid, token: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE user_id = $1 AND token = $2
            "#,
        )
        .bind(user_id)
        .bind(token)
        .execute(db)
        .await?;
        Ok(())
    }
}
