//! Delivery shifts as seen by customers.

use chrono::NaiveTime;
use sqlx::{Executor, PgPool, Postgres};

use dukkan_core::{ShiftId, ShiftWindow};

use super::RepositoryError;
use crate::models::Shift;

#[derive(Debug, sqlx::FromRow)]
struct ShiftRow {
    id: i32,
    name: String,
    start_time: NaiveTime,
    end_time: NaiveTime,
    is_active: bool,
}

impl TryFrom<ShiftRow> for Shift {
    type Error = RepositoryError;

    fn try_from(row: ShiftRow) -> Result<Self, Self::Error> {
        let window = ShiftWindow::new(row.start_time, row.end_time).map_err(|e| {
            RepositoryError::DataCorruption(format!("shift {}: {e}", row.id))
        })?;
        Ok(Self {
            id: ShiftId::new(row.id),
            name: row.name,
            window,
            is_active: row.is_active,
        })
    }
}

pub struct ShiftRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ShiftRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active shifts in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active(&self) -> Result<Vec<Shift>, RepositoryError> {
        let rows = sqlx::query_as::<_, ShiftRow>(
            "SELECT id, name, start_time, end_time, is_active
             FROM dukkan.shifts
             WHERE is_active
             ORDER BY position, start_time",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    pub(crate) async fn find_active<'e, E>(
        executor: E,
        id: ShiftId,
    ) -> Result<Option<Shift>, RepositoryError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, ShiftRow>(
            "SELECT id, name, start_time, end_time, is_active
             FROM dukkan.shifts
             WHERE id = $1 AND is_active",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        row.map(TryInto::try_into).transpose()
    }
}
