//! Product listing repository.
//!
//! All listing queries are built through [`catalog_query`] so the
//! visibility, distance, and favorite-annotation rules stay in one place.

use farmstand_core::UserId;
use sqlx::PgPool;

use super::RepositoryError;
use super::catalog::{CatalogFilter, catalog_query};
use crate::models::ProductCard;

/// How many rows the discovery queries (similar / same farm) return.
const DISCOVERY_LIMIT: i64 = 4;

/// Repository for product listings.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch a page of the catalog for `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn catalog_page(
        &self,
        filter: &CatalogFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProductCard>, RepositoryError> {
        let mut qb = catalog_query(filter);
        qb.push(" ORDER BY p.created_at DESC LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows = qb
            .build_query_as::<ProductCard>()
            .fetch_all(self.pool)
            .await?;

        Ok(rows)
    }

    /// Fetch a single listing by slug, annotated for `viewer`.
    ///
    /// Hidden listings are returned too; route handlers decide whether the
    /// viewer may see them. Archived listings are never returned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(
        &self,
        viewer: Option<UserId>,
        slug: &str,
    ) -> Result<Option<ProductCard>, RepositoryError> {
        let filter = CatalogFilter {
            viewer,
            visibility: super::Visibility::All,
            ..CatalogFilter::default()
        };

        let mut qb = catalog_query(&filter);
        qb.push(" AND p.slug = ");
        qb.push_bind(slug.to_string());

        let row = qb
            .build_query_as::<ProductCard>()
            .fetch_optional(self.pool)
            .await?;

        Ok(row)
    }

    /// Increment a listing's engagement counter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no listing has that slug.
    pub async fn increase_engagement_count(&self, slug: &str) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE product SET engagement_count = engagement_count + 1 WHERE slug = $1")
                .bind(slug)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Up to four visible listings in the same category, excluding the one
    /// being viewed, within the viewer's location rules.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn similar_to(
        &self,
        instance: &ProductCard,
        filter: &CatalogFilter,
    ) -> Result<Vec<ProductCard>, RepositoryError> {
        let filter = CatalogFilter {
            category: Some(instance.category.clone()),
            exclude_slug: Some(instance.slug.clone()),
            visibility: super::Visibility::Visible,
            ..filter.clone()
        };

        self.discovery(&filter).await
    }

    /// Up to four other visible listings from the same seller, with no
    /// distance filter (the viewer is already looking at this farm).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn from_the_same_farm(
        &self,
        instance: &ProductCard,
        viewer: Option<UserId>,
    ) -> Result<Vec<ProductCard>, RepositoryError> {
        let filter = CatalogFilter {
            viewer,
            seller: Some(instance.seller_id),
            exclude_slug: Some(instance.slug.clone()),
            ..CatalogFilter::default()
        };

        self.discovery(&filter).await
    }

    async fn discovery(&self, filter: &CatalogFilter) -> Result<Vec<ProductCard>, RepositoryError> {
        let mut qb = catalog_query(filter);
        qb.push(" ORDER BY p.engagement_count DESC LIMIT ");
        qb.push_bind(DISCOVERY_LIMIT);

        let rows = qb
            .build_query_as::<ProductCard>()
            .fetch_all(self.pool)
            .await?;

        Ok(rows)
    }
}
