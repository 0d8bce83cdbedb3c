//! Core application module
//!
//! This module contains:
//! - Session and one-shot command entry points
//! - The controller tying acquisition, decoding and presentation together

pub mod app;
pub mod controller;
