//! Shipping address repository.

use sqlx::PgPool;
use tracing::instrument;

use threadline_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::address::{Address, NewAddress};

/// Repository for a user's saved addresses.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's addresses, default first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, Address>(
            r"
            SELECT id, user_id, full_name, line1, line2, city, region, postal_code,
                   country_code, phone, is_default, created_at
            FROM storefront.address
            WHERE user_id = $1
            ORDER BY is_default DESC, created_at, id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Get one of the user's addresses.
    ///
    /// Returns `None` for addresses that don't exist or belong to someone else.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, Address>(
            r"
            SELECT id, user_id, full_name, line1, line2, city, region, postal_code,
                   country_code, phone, is_default, created_at
            FROM storefront.address
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Save a new address. The user's first address becomes the default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a concurrent insert claimed the default.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, address))]
    pub async fn create(
        &self,
        user_id: UserId,
        address: &NewAddress,
    ) -> Result<Address, RepositoryError> {
        let row = sqlx::query_as::<_, Address>(
            r"
            INSERT INTO storefront.address (
                user_id, full_name, line1, line2, city, region, postal_code,
                country_code, phone, is_default
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9,
                NOT EXISTS (SELECT 1 FROM storefront.address WHERE user_id = $1)
            )
            RETURNING id, user_id, full_name, line1, line2, city, region, postal_code,
                      country_code, phone, is_default, created_at
            ",
        )
        .bind(user_id)
        .bind(&address.full_name)
        .bind(&address.line1)
        .bind(address.line2.as_deref())
        .bind(&address.city)
        .bind(&address.region)
        .bind(&address.postal_code)
        .bind(&address.country_code)
        .bind(address.phone.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("default address already set".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(row)
    }

    /// Delete one of the user's addresses.
    ///
    /// When the default is deleted the oldest remaining address takes over.
    /// Returns `true` if an address was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: UserId, id: AddressId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let was_default = sqlx::query_scalar::<_, bool>(
            r"
            DELETE FROM storefront.address
            WHERE id = $1 AND user_id = $2
            RETURNING is_default
            ",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(was_default) = was_default else {
            return Ok(false);
        };

        if was_default {
            sqlx::query(
                r"
                UPDATE storefront.address
                SET is_default = TRUE
                WHERE id = (
                    SELECT id FROM storefront.address
                    WHERE user_id = $1
                    ORDER BY created_at, id
                    LIMIT 1
                )
                ",
            )
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(true)
    }
}
