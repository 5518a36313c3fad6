//! Domain models shared across repositories, middleware, and routes.

pub mod city;
pub mod product;
pub mod viewer;

pub use city::{City, CitySummary};
pub use product::ProductCard;
pub use viewer::ViewerId;
