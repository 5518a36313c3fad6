//! Favorite-farm relation repository.
//!
//! The catalog annotation reads this relation through an `EXISTS` subquery
//! (see `catalog.rs`); these operations are the write side.

use farmstand_core::UserId;
use sqlx::PgPool;

use super::RepositoryError;

/// Repository for the viewer-follows-seller relation.
pub struct FavoriteRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FavoriteRepository<'a> {
    /// Create a new favorite repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Whether a seller with this id exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn seller_exists(&self, seller: UserId) -> Result<bool, RepositoryError> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM site_user WHERE id = $1)")
                .bind(seller.as_i32())
                .fetch_one(self.pool)
                .await?;

        Ok(exists)
    }

    /// Add a seller to the user's favorites. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn add(&self, user: UserId, seller: UserId) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO user_favorite_farm (user_id, seller_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(user.as_i32())
        .bind(seller.as_i32())
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Remove a seller from the user's favorites. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn remove(&self, user: UserId, seller: UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM user_favorite_farm WHERE user_id = $1 AND seller_id = $2")
            .bind(user.as_i32())
            .bind(seller.as_i32())
            .execute(self.pool)
            .await?;

        Ok(())
    }
}
