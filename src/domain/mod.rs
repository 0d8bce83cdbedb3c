//! Pure domain types with minimal dependencies

pub mod geometry;

pub use geometry::*;
