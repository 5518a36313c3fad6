//! Product listing rows as returned by catalog queries.

use chrono::{DateTime, Utc};
use farmstand_core::{ProductId, UserId};
use rust_decimal::Decimal;
use serde::Serialize;

/// One catalog row: the listing plus its seller, the distance from the
/// viewer's resolved city, and the favorite-seller annotation.
///
/// `distance_miles` and `seller_is_favorite` are always present regardless
/// of location or authentication state - callers must never branch on the
/// field's existence.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductCard {
    pub id: ProductId,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: Decimal,
    #[serde(skip)]
    pub is_hidden: bool,
    pub engagement_count: i32,
    pub created_at: DateTime<Utc>,
    pub seller_id: UserId,
    pub seller_name: String,
    /// Seller's city/state, absent when the seller has no registered zip.
    pub seller_city: Option<String>,
    pub seller_state: Option<String>,
    /// Miles from the viewer's resolved city (0 when none is resolved).
    pub distance_miles: f64,
    pub seller_is_favorite: bool,
}
