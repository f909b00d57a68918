//! Delivery driver management.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use dukkan_core::DriverId;

use super::RepositoryError;
use crate::models::{Driver, DriverInput};

#[derive(Debug, sqlx::FromRow)]
struct DriverRow {
    id: i32,
    full_name: String,
    phone: String,
    vehicle: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<DriverRow> for Driver {
    fn from(row: DriverRow) -> Self {
        Self {
            id: DriverId::new(row.id),
            full_name: row.full_name,
            phone: row.phone,
            vehicle: row.vehicle,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

const DRIVER_COLUMNS: &str = "id, full_name, phone, vehicle, is_active, created_at";

pub struct DriverRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DriverRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All drivers, active first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Driver>, RepositoryError> {
        let sql = format!(
            "SELECT {DRIVER_COLUMNS} FROM dukkan.drivers ORDER BY is_active DESC, full_name"
        );
        let rows = sqlx::query_as::<_, DriverRow>(&sql)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Drivers who can take an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active(&self) -> Result<Vec<Driver>, RepositoryError> {
        let sql =
            format!("SELECT {DRIVER_COLUMNS} FROM dukkan.drivers WHERE is_active ORDER BY full_name");
        let rows = sqlx::query_as::<_, DriverRow>(&sql)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: DriverId) -> Result<Option<Driver>, RepositoryError> {
        let sql = format!("SELECT {DRIVER_COLUMNS} FROM dukkan.drivers WHERE id = $1");
        let row = sqlx::query_as::<_, DriverRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the phone number is taken.
    pub async fn create(&self, input: &DriverInput) -> Result<DriverId, RepositoryError> {
        let id: DriverId = sqlx::query_scalar(
            "INSERT INTO dukkan.drivers (full_name, phone, vehicle)
             VALUES ($1, $2, $3)
             RETURNING id",
        )
        .bind(input.full_name.as_str())
        .bind(input.phone.as_str())
        .bind(input.vehicle.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "phone"))?;
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the driver does not exist,
    /// `RepositoryError::Conflict` if the phone number is taken.
    pub async fn update(&self, id: DriverId, input: &DriverInput) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE dukkan.drivers SET full_name = $2, phone = $3, vehicle = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(input.full_name.as_str())
        .bind(input.phone.as_str())
        .bind(input.vehicle.as_deref())
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "phone"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Flip `is_active`. Assigned orders keep their driver.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the driver does not exist.
    pub async fn toggle_active(&self, id: DriverId) -> Result<bool, RepositoryError> {
        let active: Option<bool> = sqlx::query_scalar(
            "UPDATE dukkan.drivers SET is_active = NOT is_active WHERE id = $1 RETURNING is_active",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        active.ok_or(RepositoryError::NotFound)
    }
}
