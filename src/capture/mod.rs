//! Image acquisition and decoding
//!
//! This module consolidates:
//! - QR code decoding (qr.rs)
//! - File acquisition and preview (image.rs)

pub mod image;
pub mod qr;

pub use qr::{DecodeOptions, DecodeResult, InversionPolicy, decode};
