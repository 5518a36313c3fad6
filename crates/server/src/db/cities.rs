//! City reference-data repository.
//!
//! Cities, states, and countries are imported once by `fs-cli import-cities`
//! and treated as read-only at request time. The repository also records
//! failed geo-IP lookups so gaps between the geo-IP database and the city
//! catalog are visible.

use async_trait::async_trait;
use farmstand_core::{CityId, CountryId, GeoPoint, StateId, ZipCodeId};
use sqlx::PgPool;

use super::RepositoryError;
use crate::location::CityDirectory;
use crate::models::{City, CitySummary};

/// One city row with its state and country joined in.
#[derive(sqlx::FromRow)]
struct CityRow {
    id: i32,
    name: String,
    slug: String,
    state: String,
    state_full: String,
    country: String,
    latitude: f64,
    longitude: f64,
}

impl From<CityRow> for City {
    fn from(row: CityRow) -> Self {
        Self {
            id: CityId::new(row.id),
            name: row.name,
            slug: row.slug,
            state: row.state,
            state_full: row.state_full,
            country: row.country,
            point: GeoPoint::new(row.latitude, row.longitude),
        }
    }
}

const CITY_SELECT: &str = "SELECT c.id, c.name, c.slug, s.name AS state, \
     s.full_name AS state_full, co.name AS country, c.latitude, c.longitude \
     FROM location_city c \
     JOIN location_state s ON s.id = c.state_id \
     JOIN location_country co ON co.id = s.country_id";

/// Repository for city reference data.
pub struct CityRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CityRepository<'a> {
    /// Create a new city repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a city by its unique slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<City>, RepositoryError> {
        let row = sqlx::query_as::<_, CityRow>(&format!("{CITY_SELECT} WHERE c.slug = $1"))
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(City::from))
    }

    /// Get a city by name and state, case-insensitively.
    ///
    /// The state input may be either the abbreviation or the full name;
    /// geo-IP region data varies between the two.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_name_state(
        &self,
        name: &str,
        state: &str,
    ) -> Result<Option<City>, RepositoryError> {
        let row = sqlx::query_as::<_, CityRow>(&format!(
            "{CITY_SELECT} WHERE LOWER(c.name) = LOWER($1) \
             AND (LOWER(s.name) = LOWER($2) OR LOWER(s.full_name) = LOWER($2))"
        ))
        .bind(name)
        .bind(state)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(City::from))
    }

    /// List serviceable cities, optionally restricted to one state slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        state_slug: Option<&str>,
    ) -> Result<Vec<CitySummary>, RepositoryError> {
        let base = "SELECT c.slug, c.name, s.name AS state, co.name AS country \
             FROM location_city c \
             JOIN location_state s ON s.id = c.state_id \
             JOIN location_country co ON co.id = s.country_id";

        let rows = match state_slug {
            Some(state) => {
                sqlx::query_as::<_, CitySummary>(&format!(
                    "{base} WHERE s.slug = $1 ORDER BY c.name"
                ))
                .bind(state)
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, CitySummary>(&format!("{base} ORDER BY c.name"))
                    .fetch_all(self.pool)
                    .await?
            }
        };

        Ok(rows)
    }

    /// Record a geo-IP attempt that did not map cleanly onto the catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn record_failed_lookup(
        &self,
        ip_address: &str,
        determined_city: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO ip_location_log (ip_address, determined_city) VALUES ($1, $2)")
            .bind(ip_address)
            .bind(determined_city)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Import operations, used only by `fs-cli import-cities`
    // -------------------------------------------------------------------------

    /// Insert or refresh a country, returning its id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn upsert_country(
        &self,
        name: &str,
        slug: &str,
    ) -> Result<CountryId, RepositoryError> {
        let (id,): (i32,) = sqlx::query_as(
            "INSERT INTO location_country (name, slug) VALUES ($1, $2) \
             ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name \
             RETURNING id",
        )
        .bind(name)
        .bind(slug)
        .fetch_one(self.pool)
        .await?;

        Ok(CountryId::new(id))
    }

    /// Insert or refresh a state, returning its id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn upsert_state(
        &self,
        country: CountryId,
        name: &str,
        full_name: &str,
        slug: &str,
    ) -> Result<StateId, RepositoryError> {
        let (id,): (i32,) = sqlx::query_as(
            "INSERT INTO location_state (name, full_name, slug, country_id) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (slug) DO UPDATE \
             SET name = EXCLUDED.name, full_name = EXCLUDED.full_name \
             RETURNING id",
        )
        .bind(name)
        .bind(full_name)
        .bind(slug)
        .bind(country.as_i32())
        .fetch_one(self.pool)
        .await?;

        Ok(StateId::new(id))
    }

    /// Insert or refresh a city, returning its id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn upsert_city(
        &self,
        state: StateId,
        name: &str,
        slug: &str,
        point: GeoPoint,
    ) -> Result<CityId, RepositoryError> {
        let (id,): (i32,) = sqlx::query_as(
            "INSERT INTO location_city (name, slug, state_id, latitude, longitude) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (slug) DO UPDATE \
             SET name = EXCLUDED.name, latitude = EXCLUDED.latitude, \
                 longitude = EXCLUDED.longitude \
             RETURNING id",
        )
        .bind(name)
        .bind(slug)
        .bind(state.as_i32())
        .bind(point.latitude)
        .bind(point.longitude)
        .fetch_one(self.pool)
        .await?;

        Ok(CityId::new(id))
    }

    /// Insert or refresh a zip code, returning its id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn upsert_zip_code(
        &self,
        city: CityId,
        name: &str,
        slug: &str,
        point: GeoPoint,
    ) -> Result<ZipCodeId, RepositoryError> {
        let (id,): (i32,) = sqlx::query_as(
            "INSERT INTO location_zip_code (name, slug, city_id, latitude, longitude) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (slug) DO UPDATE \
             SET name = EXCLUDED.name, city_id = EXCLUDED.city_id, \
                 latitude = EXCLUDED.latitude, longitude = EXCLUDED.longitude \
             RETURNING id",
        )
        .bind(name)
        .bind(slug)
        .bind(city.as_i32())
        .bind(point.latitude)
        .bind(point.longitude)
        .fetch_one(self.pool)
        .await?;

        Ok(ZipCodeId::new(id))
    }
}

#[async_trait]
impl CityDirectory for CityRepository<'_> {
    async fn by_name_state(
        &self,
        name: &str,
        state: &str,
    ) -> Result<Option<City>, RepositoryError> {
        self.get_by_name_state(name, state).await
    }

    async fn by_slug(&self, slug: &str) -> Result<Option<City>, RepositoryError> {
        self.get_by_slug(slug).await
    }

    async fn log_failed_lookup(
        &self,
        ip_address: &str,
        determined_city: &str,
    ) -> Result<(), RepositoryError> {
        self.record_failed_lookup(ip_address, determined_city).await
    }
}
