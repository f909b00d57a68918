//! In-app notification repository.

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};

use dukkan_core::{NotificationId, UserId};

use super::RepositoryError;
use crate::models::{NewNotification, Notification};

#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: i32,
    title: String,
    body: String,
    link: Option<String>,
    read_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: NotificationId::new(row.id),
            title: row.title,
            body: row.body,
            link: row.link,
            read_at: row.read_at,
            created_at: row.created_at,
        }
    }
}

pub struct NotificationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> NotificationRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Latest notifications for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            "SELECT id, title, body, link, read_at, created_at
             FROM dukkan.user_notifications
             WHERE user_id = $1
             ORDER BY created_at DESC
             LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn unread_count(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM dukkan.user_notifications
             WHERE user_id = $1 AND read_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    /// Mark every unread notification as read. Returns how many changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_all_read(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE dukkan.user_notifications SET read_at = NOW()
             WHERE user_id = $1 AND read_at IS NULL",
        )
        .bind(user_id)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub(crate) async fn insert<'e, E>(
        executor: E,
        user_id: UserId,
        notification: &NewNotification,
    ) -> Result<(), RepositoryError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "INSERT INTO dukkan.user_notifications (user_id, title, body, link)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(user_id)
        .bind(&notification.title)
        .bind(&notification.body)
        .bind(notification.link.as_deref())
        .execute(executor)
        .await?;
        Ok(())
    }
}
