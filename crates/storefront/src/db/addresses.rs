//! Address book repository.
//!
//! Every query is scoped by `user_id`; an address belonging to someone else
//! behaves exactly like a missing one. The partial unique index
//! `idx_addresses_one_default` keeps at most one default per user. Writes that
//! can move the default lock the owning user row first, so they run one at
//! a time per user.

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres, Transaction};

use dukkan_core::{AddressId, GeoPoint, UserId};

use super::RepositoryError;
use crate::models::{Address, AddressInput};

const ADDRESS_COLUMNS: &str = "id, user_id, label, district, street, building, floor, \
     apartment, landmark, instructions, lat, lng, is_default, created_at";

#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: i32,
    user_id: i32,
    label: Option<String>,
    district: String,
    street: String,
    building: String,
    floor: Option<String>,
    apartment: Option<String>,
    landmark: Option<String>,
    instructions: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    is_default: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<AddressRow> for Address {
    type Error = RepositoryError;

    fn try_from(row: AddressRow) -> Result<Self, Self::Error> {
        let location = match (row.lat, row.lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng).map_err(|e| {
                RepositoryError::DataCorruption(format!("address {}: {e}", row.id))
            })?),
            _ => None,
        };

        Ok(Self {
            id: AddressId::new(row.id),
            user_id: UserId::new(row.user_id),
            label: row.label,
            district: row.district,
            street: row.street,
            building: row.building,
            floor: row.floor,
            apartment: row.apartment,
            landmark: row.landmark,
            instructions: row.instructions,
            location,
            is_default: row.is_default,
            created_at: row.created_at,
        })
    }
}

pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's addresses, default first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let sql = format!(
            "SELECT {ADDRESS_COLUMNS} FROM dukkan.addresses
             WHERE user_id = $1
             ORDER BY is_default DESC, created_at DESC"
        );
        let rows = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// An address only if it belongs to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_owned(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        Self::find_owned(self.pool, user_id, id).await
    }

    pub(crate) async fn find_owned<'e, E>(
        executor: E,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql =
            format!("SELECT {ADDRESS_COLUMNS} FROM dukkan.addresses WHERE id = $1 AND user_id = $2");
        let row = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(executor)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create an address. The user's first address becomes the default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn create(
        &self,
        user_id: UserId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        lock_user(&mut tx, user_id).await?;

        let has_default: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM dukkan.addresses WHERE user_id = $1 AND is_default)",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let sql = format!(
            "INSERT INTO dukkan.addresses
                 (user_id, label, district, street, building, floor, apartment,
                  landmark, instructions, lat, lng, is_default)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {ADDRESS_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(user_id)
            .bind(input.label.as_deref())
            .bind(&input.district)
            .bind(&input.street)
            .bind(&input.building)
            .bind(input.floor.as_deref())
            .bind(input.apartment.as_deref())
            .bind(input.landmark.as_deref())
            .bind(input.instructions.as_deref())
            .bind(input.location.map(|p| p.lat))
            .bind(input.location.map(|p| p.lng))
            .bind(!has_default)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        row.try_into()
    }

    /// Replace an owned address's fields. The default flag is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address is not the user's.
    pub async fn update(
        &self,
        user_id: UserId,
        id: AddressId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let sql = format!(
            "UPDATE dukkan.addresses
             SET label = $3, district = $4, street = $5, building = $6, floor = $7,
                 apartment = $8, landmark = $9, instructions = $10, lat = $11, lng = $12,
                 updated_at = NOW()
             WHERE id = $1 AND user_id = $2
             RETURNING {ADDRESS_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(input.label.as_deref())
            .bind(&input.district)
            .bind(&input.street)
            .bind(&input.building)
            .bind(input.floor.as_deref())
            .bind(input.apartment.as_deref())
            .bind(input.landmark.as_deref())
            .bind(input.instructions.as_deref())
            .bind(input.location.map(|p| p.lat))
            .bind(input.location.map(|p| p.lng))
            .fetch_optional(self.pool)
            .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Delete an owned address. If it was the default, the most recently
    /// created remaining address becomes the default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address is not the user's,
    /// `RepositoryError::Conflict` if an order still references it.
    pub async fn delete(&self, user_id: UserId, id: AddressId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_user(&mut tx, user_id).await?;

        let was_default: Option<bool> = sqlx::query_scalar(
            "DELETE FROM dukkan.addresses WHERE id = $1 AND user_id = $2 RETURNING is_default",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                RepositoryError::Conflict("address is used by an order".to_string())
            }
            other => RepositoryError::Database(other),
        })?;

        match was_default {
            None => return Err(RepositoryError::NotFound),
            Some(true) => {
                sqlx::query(
                    "UPDATE dukkan.addresses SET is_default = TRUE, updated_at = NOW()
                     WHERE id = (
                         SELECT id FROM dukkan.addresses
                         WHERE user_id = $1
                         ORDER BY created_at DESC, id DESC
                         LIMIT 1
                     )",
                )
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
            }
            Some(false) => {}
        }

        tx.commit().await?;
        Ok(())
    }

    /// Make an owned address the default, clearing the previous one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address is not the user's.
    pub async fn set_default(&self, user_id: UserId, id: AddressId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_user(&mut tx, user_id).await?;

        if Self::find_owned(&mut *tx, user_id, id).await?.is_none() {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query(
            "UPDATE dukkan.addresses SET is_default = FALSE, updated_at = NOW()
             WHERE user_id = $1 AND is_default AND id <> $2",
        )
        .bind(user_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE dukkan.addresses SET is_default = TRUE, updated_at = NOW()
             WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

/// Serialises default-moving writes for one user.
async fn lock_user(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
) -> Result<(), RepositoryError> {
    sqlx::query("SELECT id FROM dukkan.users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
