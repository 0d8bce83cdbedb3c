//! Canvas rendering module
//!
//! This module contains:
//! - The display canvas (preview, boundary overlay, PNG export)
//! - Boundary drawing using tiny-skia

pub mod canvas;
pub mod image;

pub use canvas::Canvas;
pub use self::image::BoundaryStyle;
