//! Product catalog endpoints.
//!
//! Every listing query goes through the shared catalog filter, so the
//! visibility and distance rules here reduce to choosing filter values.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use farmstand_core::UserId;
use serde::{Deserialize, Serialize};

use crate::db::{CatalogFilter, Near, ProductRepository, Visibility};
use crate::error::{AppError, Result};
use crate::location::ResolvedLocation;
use crate::models::{
    ProductCard,
    viewer::{RequireUser, Viewer, ViewerId},
};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// Pagination and filtering parameters for listing endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    /// 1-based page number.
    pub page: Option<i64>,
    /// Rows per page, capped at [`MAX_PAGE_SIZE`].
    pub per_page: Option<i64>,
    /// Restrict to one category.
    pub category: Option<String>,
}

impl CatalogQuery {
    fn limit(&self) -> i64 {
        self.per_page
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    fn offset(&self) -> i64 {
        (self.page.unwrap_or(1).max(1) - 1) * self.limit()
    }
}

/// A product detail with its discovery rails.
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: ProductCard,
    /// Visible listings in the same category near the viewer.
    pub similar_products: Vec<ProductCard>,
    /// Other visible listings from the same seller.
    pub from_the_same_farm: Vec<ProductCard>,
}

/// The viewer's current location as a catalog distance bound, if any.
async fn viewer_near(state: &AppState, viewer: &ViewerId) -> Option<Near> {
    let location = state.locations().get(viewer).await.unwrap_or_else(|| {
        ResolvedLocation::unresolved(state.config().location.default_lookup_radius)
    });

    location.city.map(|city| Near {
        point: city.point,
        radius_miles: location.lookup_radius,
    })
}

/// GET /api/products
///
/// The public catalog: visible listings near the viewer's resolved city,
/// newest first.
pub async fn list_products(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<ProductCard>>> {
    let filter = CatalogFilter {
        viewer: viewer.user_id(),
        near: viewer_near(&state, &viewer).await,
        visibility: Visibility::Visible,
        category: query.category.clone(),
        ..CatalogFilter::default()
    };

    let products = ProductRepository::new(state.pool())
        .catalog_page(&filter, query.limit(), query.offset())
        .await?;

    Ok(Json(products))
}

/// GET /api/products/{slug}
///
/// One listing with its discovery rails. Hidden listings are visible only
/// to their owner; everyone else gets a 404 indistinguishable from a
/// missing slug. Each successful view bumps the engagement counter.
pub async fn product_detail(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Path(slug): Path<String>,
) -> Result<Json<ProductDetail>> {
    let repo = ProductRepository::new(state.pool());

    let product = repo
        .get_by_slug(viewer.user_id(), &slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product '{slug}'")))?;

    if product.is_hidden && viewer.user_id() != Some(product.seller_id) {
        return Err(AppError::NotFound(format!("product '{slug}'")));
    }

    repo.increase_engagement_count(&slug).await?;

    let discovery_filter = CatalogFilter {
        viewer: viewer.user_id(),
        near: viewer_near(&state, &viewer).await,
        ..CatalogFilter::default()
    };

    let similar_products = repo.similar_to(&product, &discovery_filter).await?;
    let from_the_same_farm = repo
        .from_the_same_farm(&product, viewer.user_id())
        .await?;

    Ok(Json(ProductDetail {
        product,
        similar_products,
        from_the_same_farm,
    }))
}

/// GET /api/products/mine
///
/// The authenticated seller's own visible listings, with no distance
/// filter.
pub async fn my_products(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<ProductCard>>> {
    my_listings(&state, user, Visibility::Visible, &query).await
}

/// GET /api/products/mine/hidden
///
/// The authenticated seller's hidden listings.
pub async fn my_hidden_products(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<ProductCard>>> {
    my_listings(&state, user, Visibility::HiddenOnly, &query).await
}

async fn my_listings(
    state: &AppState,
    user: UserId,
    visibility: Visibility,
    query: &CatalogQuery,
) -> Result<Json<Vec<ProductCard>>> {
    let filter = CatalogFilter {
        viewer: Some(user),
        seller: Some(user),
        visibility,
        category: query.category.clone(),
        ..CatalogFilter::default()
    };

    let products = ProductRepository::new(state.pool())
        .catalog_page(&filter, query.limit(), query.offset())
        .await?;

    Ok(Json(products))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_query_defaults() {
        let query = CatalogQuery::default();
        assert_eq!(query.limit(), 20);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn test_catalog_query_caps_page_size() {
        let query = CatalogQuery {
            per_page: Some(10_000),
            ..CatalogQuery::default()
        };
        assert_eq!(query.limit(), 100);

        let query = CatalogQuery {
            per_page: Some(0),
            ..CatalogQuery::default()
        };
        assert_eq!(query.limit(), 1);
    }

    #[test]
    fn test_catalog_query_offset() {
        let query = CatalogQuery {
            page: Some(3),
            per_page: Some(25),
            ..CatalogQuery::default()
        };
        assert_eq!(query.offset(), 50);

        let query = CatalogQuery {
            page: Some(0),
            ..CatalogQuery::default()
        };
        assert_eq!(query.offset(), 0);
    }
}
