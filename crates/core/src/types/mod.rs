//! Core types for Farmstand.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod point;
pub mod slug;

pub use id::*;
pub use point::GeoPoint;
pub use slug::slugify;
