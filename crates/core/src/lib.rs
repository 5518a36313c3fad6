//! Farmstand Core - Shared types library.
//!
//! This crate provides common types used across all Farmstand components:
//! - `server` - Public marketplace API
//! - `cli` - Command-line tools for migrations and reference-data import
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, geographic points, and slug generation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
