//! Farmstand server library.
//!
//! Location-aware product catalog for a local-farm marketplace: viewers are
//! resolved to a serviceable city (geo-IP with a default-city fallback) and
//! the catalog is filtered and annotated around that location.
//!
//! This crate exposes the server as a library so the CLI can reuse the
//! repositories and embedded migrations.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod geoip;
pub mod location;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
