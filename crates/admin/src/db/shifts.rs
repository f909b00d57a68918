//! Delivery shift management.

use chrono::NaiveTime;
use sqlx::PgPool;

use dukkan_core::{ShiftId, ShiftWindow};

use super::RepositoryError;
use crate::models::{Shift, ShiftInput};

#[derive(Debug, sqlx::FromRow)]
struct ShiftRow {
    id: i32,
    name: String,
    start_time: NaiveTime,
    end_time: NaiveTime,
    is_active: bool,
    position: i32,
}

impl TryFrom<ShiftRow> for Shift {
    type Error = RepositoryError;

    fn try_from(row: ShiftRow) -> Result<Self, Self::Error> {
        let window = ShiftWindow::new(row.start_time, row.end_time)
            .map_err(|e| RepositoryError::DataCorruption(format!("shift {}: {e}", row.id)))?;
        Ok(Self {
            id: ShiftId::new(row.id),
            name: row.name,
            window,
            is_active: row.is_active,
            position: row.position,
        })
    }
}

const SHIFT_COLUMNS: &str = "id, name, start_time, end_time, is_active, position";

pub struct ShiftRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ShiftRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All shifts in checkout order, inactive included.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Shift>, RepositoryError> {
        let sql =
            format!("SELECT {SHIFT_COLUMNS} FROM dukkan.shifts ORDER BY position, start_time");
        let rows = sqlx::query_as::<_, ShiftRow>(&sql)
            .fetch_all(self.pool)
            .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ShiftId) -> Result<Option<Shift>, RepositoryError> {
        let sql = format!("SELECT {SHIFT_COLUMNS} FROM dukkan.shifts WHERE id = $1");
        let row = sqlx::query_as::<_, ShiftRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        row.map(TryInto::try_into).transpose()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, input: &ShiftInput) -> Result<ShiftId, RepositoryError> {
        let id: ShiftId = sqlx::query_scalar(
            "INSERT INTO dukkan.shifts (name, start_time, end_time, position)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(&input.name)
        .bind(input.window.start)
        .bind(input.window.end)
        .bind(input.position)
        .fetch_one(self.pool)
        .await?;
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the shift does not exist.
    pub async fn update(&self, id: ShiftId, input: &ShiftInput) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE dukkan.shifts
             SET name = $2, start_time = $3, end_time = $4, position = $5
             WHERE id = $1",
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.window.start)
        .bind(input.window.end)
        .bind(input.position)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Flip `is_active`. Inactive shifts disappear from checkout but stay on
    /// existing orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the shift does not exist.
    pub async fn toggle_active(&self, id: ShiftId) -> Result<bool, RepositoryError> {
        let active: Option<bool> = sqlx::query_scalar(
            "UPDATE dukkan.shifts SET is_active = NOT is_active WHERE id = $1 RETURNING is_active",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        active.ok_or(RepositoryError::NotFound)
    }
}
