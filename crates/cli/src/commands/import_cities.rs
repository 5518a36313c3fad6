//! City catalog import.
//!
//! Reads a CSV of serviceable places and upserts the country / state /
//! city / zip-code hierarchy. Slugs are derived here and are stable across
//! re-imports, so running the same file twice refreshes names and
//! coordinates without duplicating rows.

use std::collections::HashMap;
use std::path::Path;

use farmstand_core::{CityId, CountryId, GeoPoint, StateId, slugify};
use farmstand_server::db::CityRepository;
use serde::Deserialize;
use sqlx::PgPool;

use super::CliError;

/// One CSV row of the import file.
#[derive(Debug, Deserialize)]
struct CityRecord {
    country: String,
    state: String,
    state_full: String,
    city: String,
    zip_code: String,
    latitude: f64,
    longitude: f64,
}

impl CityRecord {
    /// City slugs carry the state abbreviation so same-named cities in
    /// different states stay distinct ("Brooklyn" + "NY" -> `brooklyn-ny`).
    fn city_slug(&self) -> String {
        slugify(&format!("{} {}", self.city, self.state))
    }

    fn state_slug(&self) -> String {
        slugify(&self.state_full)
    }

    fn country_slug(&self) -> String {
        slugify(&self.country)
    }

    fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Import the city catalog from `file`.
pub async fn run(pool: &PgPool, file: &Path) -> Result<(), CliError> {
    tracing::info!(file = %file.display(), "Importing city catalog...");

    let repo = CityRepository::new(pool);
    let mut reader = csv::Reader::from_path(file)?;

    // Parent rows repeat for every zip code; cache their ids by slug.
    let mut countries: HashMap<String, CountryId> = HashMap::new();
    let mut states: HashMap<String, StateId> = HashMap::new();
    let mut cities: HashMap<String, CityId> = HashMap::new();

    let mut zip_codes = 0u64;

    for result in reader.deserialize() {
        let record: CityRecord = result?;

        let country_slug = record.country_slug();
        let country_id = match countries.get(&country_slug) {
            Some(id) => *id,
            None => {
                let id = repo.upsert_country(&record.country, &country_slug).await?;
                countries.insert(country_slug, id);
                id
            }
        };

        let state_slug = record.state_slug();
        let state_id = match states.get(&state_slug) {
            Some(id) => *id,
            None => {
                let id = repo
                    .upsert_state(country_id, &record.state, &record.state_full, &state_slug)
                    .await?;
                states.insert(state_slug, id);
                id
            }
        };

        let city_slug = record.city_slug();
        let city_id = match cities.get(&city_slug) {
            Some(id) => *id,
            None => {
                let id = repo
                    .upsert_city(state_id, &record.city, &city_slug, record.point())
                    .await?;
                cities.insert(city_slug, id);
                id
            }
        };

        repo.upsert_zip_code(
            city_id,
            &record.zip_code,
            &slugify(&record.zip_code),
            record.point(),
        )
        .await?;
        zip_codes += 1;
    }

    tracing::info!(
        countries = countries.len(),
        states = states.len(),
        cities = cities.len(),
        zip_codes,
        "Import complete"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CityRecord {
        CityRecord {
            country: "United States".to_string(),
            state: "NY".to_string(),
            state_full: "New York".to_string(),
            city: "Brooklyn".to_string(),
            zip_code: "11201".to_string(),
            latitude: 40.6944,
            longitude: -73.9906,
        }
    }

    #[test]
    fn test_slug_derivation() {
        let record = record();
        assert_eq!(record.city_slug(), "brooklyn-ny");
        assert_eq!(record.state_slug(), "new-york");
        assert_eq!(record.country_slug(), "united-states");
    }

    #[test]
    fn test_csv_parsing() {
        let data = "country,state,state_full,city,zip_code,latitude,longitude\n\
                    United States,MA,Massachusetts,Boston,02108,42.3587,-71.0636\n";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let records: Vec<CityRecord> = reader
            .deserialize()
            .collect::<Result<_, _>>()
            .expect("valid csv");

        assert_eq!(records.len(), 1);
        let boston = records.first().expect("one record");
        assert_eq!(boston.city_slug(), "boston-ma");
        assert!((boston.point().latitude - 42.3587).abs() < f64::EPSILON);
    }
}
