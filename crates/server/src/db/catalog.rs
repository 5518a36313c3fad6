//! Catalog query construction.
//!
//! Every product listing query in the API is built here from a
//! [`CatalogFilter`]: the base visibility rules (archived listings never
//! appear, hidden listings only for their owner), the optional distance
//! bound against the viewer's resolved city, and the favorite-seller
//! annotation. Ordering and pagination are appended by the repository,
//! never here.
//!
//! Distance is a haversine expression over the seller zip code's
//! latitude/longitude columns, so no geospatial extension is required.
//! When the viewer has no resolved city the distance column is a constant
//! `0.0` and no distance predicate is applied - the catalog degrades to
//! "all locations" while keeping a uniform row shape.

use farmstand_core::{GeoPoint, UserId};
use sqlx::{Postgres, QueryBuilder};

/// Mean earth radius in miles, matching `GeoPoint::distance_miles`.
const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Which hidden/visible subset of listings a query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Only listings that are not hidden. The public catalog.
    #[default]
    Visible,
    /// Only hidden listings. Restricted to the owner's own set.
    HiddenOnly,
    /// Hidden and visible alike (e.g. a seller's full inventory).
    All,
}

/// A distance bound around a resolved city.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Near {
    /// The resolved city's point.
    pub point: GeoPoint,
    /// Maximum seller distance in miles. Zero or negative means
    /// exact-location sellers only (`distance <= 0`), not an error.
    pub radius_miles: i32,
}

impl Near {
    /// The bound actually bound into SQL. Haversine distance is never
    /// negative, so a negative radius clamps to zero to keep the
    /// exact-location predicate satisfiable.
    fn bound_miles(&self) -> f64 {
        f64::from(self.radius_miles.max(0))
    }
}

/// Filter parameters for a catalog query.
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    /// Authenticated viewer, if any; drives the favorite-seller annotation.
    /// Anonymous viewers get a constant `false` so the column is always
    /// present.
    pub viewer: Option<UserId>,
    /// Distance bound; `None` disables location filtering entirely.
    pub near: Option<Near>,
    /// Hidden/visible subset.
    pub visibility: Visibility,
    /// Restrict to a single seller's listings.
    pub seller: Option<UserId>,
    /// Restrict to a category (used by "similar products").
    pub category: Option<String>,
    /// Exclude one listing by slug (the one currently being viewed).
    pub exclude_slug: Option<String>,
}

/// Build the shared catalog query for `filter`.
///
/// The returned builder holds a complete `SELECT ... WHERE ...` statement
/// producing [`crate::models::ProductCard`] rows; callers append ordering
/// and `LIMIT`/`OFFSET`.
#[must_use]
pub fn catalog_query(filter: &CatalogFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(
        "SELECT p.id, p.slug, p.title, p.description, p.category, p.price, \
         p.is_hidden, p.engagement_count, p.created_at, \
         p.seller_id, u.display_name AS seller_name, \
         c.name AS seller_city, s.name AS seller_state, ",
    );

    // Distance column - constant 0.0 when no city is resolved so the row
    // shape does not depend on location state.
    match &filter.near {
        Some(near) => push_distance_expr(&mut qb, near.point),
        None => {
            qb.push("0.0::float8");
        }
    }
    qb.push(" AS distance_miles, ");

    // Favorite-seller annotation - always present, constant FALSE for
    // anonymous viewers.
    match filter.viewer {
        Some(viewer) => {
            qb.push(
                "EXISTS (SELECT 1 FROM user_favorite_farm f \
                 WHERE f.user_id = ",
            );
            qb.push_bind(viewer.as_i32());
            qb.push(" AND f.seller_id = p.seller_id)");
        }
        None => {
            qb.push("FALSE");
        }
    }
    qb.push(" AS seller_is_favorite");

    qb.push(
        " FROM product p \
         JOIN site_user u ON u.id = p.seller_id \
         LEFT JOIN location_zip_code z ON z.id = u.zip_code_id \
         LEFT JOIN location_city c ON c.id = z.city_id \
         LEFT JOIN location_state s ON s.id = c.state_id \
         WHERE p.is_archived = FALSE",
    );

    match filter.visibility {
        Visibility::Visible => {
            qb.push(" AND p.is_hidden = FALSE");
        }
        Visibility::HiddenOnly => {
            qb.push(" AND p.is_hidden = TRUE");
        }
        Visibility::All => {}
    }

    if let Some(seller) = filter.seller {
        qb.push(" AND p.seller_id = ");
        qb.push_bind(seller.as_i32());
    }

    if let Some(category) = &filter.category {
        qb.push(" AND p.category = ");
        qb.push_bind(category.clone());
    }

    if let Some(slug) = &filter.exclude_slug {
        qb.push(" AND p.slug <> ");
        qb.push_bind(slug.clone());
    }

    // Sellers without a registered zip code have a NULL distance and drop
    // out of location-filtered catalogs here.
    if let Some(near) = &filter.near {
        qb.push(" AND ");
        push_distance_expr(&mut qb, near.point);
        qb.push(" <= ");
        qb.push_bind(near.bound_miles());
    }

    qb
}

/// Push the haversine distance (miles) between the seller's zip point and
/// `point` onto the builder.
fn push_distance_expr(qb: &mut QueryBuilder<'static, Postgres>, point: GeoPoint) {
    qb.push("2 * ");
    qb.push(EARTH_RADIUS_MILES);
    qb.push(" * asin(sqrt(least(1.0, pow(sin(radians(z.latitude - ");
    qb.push_bind(point.latitude);
    qb.push(") / 2), 2) + cos(radians(");
    qb.push_bind(point.latitude);
    qb.push(")) * cos(radians(z.latitude)) * pow(sin(radians(z.longitude - ");
    qb.push_bind(point.longitude);
    qb.push(") / 2), 2))))");
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOSTON: GeoPoint = GeoPoint::new(42.3601, -71.0589);

    fn sql(filter: &CatalogFilter) -> String {
        catalog_query(filter).sql().to_string()
    }

    #[test]
    fn test_archived_always_excluded() {
        for visibility in [Visibility::Visible, Visibility::HiddenOnly, Visibility::All] {
            let query = sql(&CatalogFilter {
                visibility,
                ..CatalogFilter::default()
            });
            assert!(query.contains("p.is_archived = FALSE"), "{query}");
        }
    }

    #[test]
    fn test_visibility_predicates() {
        let visible = sql(&CatalogFilter::default());
        assert!(visible.contains("p.is_hidden = FALSE"));

        let hidden = sql(&CatalogFilter {
            visibility: Visibility::HiddenOnly,
            ..CatalogFilter::default()
        });
        assert!(hidden.contains("p.is_hidden = TRUE"));

        let all = sql(&CatalogFilter {
            visibility: Visibility::All,
            ..CatalogFilter::default()
        });
        assert!(!all.contains("p.is_hidden ="));
    }

    #[test]
    fn test_anonymous_viewer_gets_constant_false_annotation() {
        let query = sql(&CatalogFilter::default());
        assert!(query.contains("FALSE AS seller_is_favorite"));
        assert!(!query.contains("user_favorite_farm"));
    }

    #[test]
    fn test_authenticated_viewer_gets_exists_annotation() {
        let query = sql(&CatalogFilter {
            viewer: Some(UserId::new(5)),
            ..CatalogFilter::default()
        });
        assert!(query.contains("EXISTS (SELECT 1 FROM user_favorite_farm"));
        assert!(query.contains("AS seller_is_favorite"));
    }

    #[test]
    fn test_no_city_means_no_distance_predicate() {
        let query = sql(&CatalogFilter::default());
        assert!(query.contains("0.0::float8 AS distance_miles"));
        assert!(!query.contains("asin"));
    }

    #[test]
    fn test_distance_filter_present_with_city() {
        let query = sql(&CatalogFilter {
            near: Some(Near {
                point: BOSTON,
                radius_miles: 20,
            }),
            ..CatalogFilter::default()
        });
        // Expression appears twice: the SELECT column and the predicate.
        assert_eq!(query.matches("asin(sqrt(least(1.0,").count(), 2);
        assert!(query.contains("AS distance_miles"));
        assert!(query.contains("<= "));
    }

    #[test]
    fn test_negative_radius_clamps_to_exact_location_bound() {
        let exact = Near {
            point: BOSTON,
            radius_miles: 0,
        };
        let negative = Near {
            point: BOSTON,
            radius_miles: -5,
        };
        let normal = Near {
            point: BOSTON,
            radius_miles: 20,
        };

        // Distance is never negative, so a negative bound would match
        // nothing; it must behave exactly like radius zero.
        assert!((negative.bound_miles() - 0.0).abs() < f64::EPSILON);
        assert!((exact.bound_miles() - 0.0).abs() < f64::EPSILON);
        assert!((normal.bound_miles() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_distance_bound_is_the_only_extra_constraint() {
        // An unresolved location must produce the same visible set as any
        // resolved one with an unlimited radius: apart from the distance
        // column and its single predicate, the queries are identical.
        let unfiltered = sql(&CatalogFilter::default());
        let bounded = sql(&CatalogFilter {
            near: Some(Near {
                point: BOSTON,
                radius_miles: i32::MAX,
            }),
            ..CatalogFilter::default()
        });

        let shared = " AS distance_miles, FALSE AS seller_is_favorite FROM product p ";
        let tail_unfiltered = unfiltered.split(shared).nth(1).expect("shared shape");
        let tail_bounded = bounded.split(shared).nth(1).expect("shared shape");

        let extra = tail_bounded
            .strip_prefix(tail_unfiltered)
            .expect("identical predicates up to the distance bound");
        assert!(extra.starts_with(" AND "));
        assert!(extra.contains("asin"));
    }

    #[test]
    fn test_seller_category_and_exclusion_predicates() {
        let query = sql(&CatalogFilter {
            seller: Some(UserId::new(9)),
            category: Some("eggs".to_string()),
            exclude_slug: Some("dozen-brown-eggs".to_string()),
            ..CatalogFilter::default()
        });
        assert!(query.contains("p.seller_id = "));
        assert!(query.contains("p.category = "));
        assert!(query.contains("p.slug <> "));
    }

    #[test]
    fn test_no_ordering_or_pagination_in_base_query() {
        let query = sql(&CatalogFilter::default());
        assert!(!query.contains("ORDER BY"));
        assert!(!query.contains("LIMIT"));
    }
}
