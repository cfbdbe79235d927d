//! # VDC Common Library
//!
//! Shared code for the video dataset checker crates:
//! - Error type
//! - Configuration loading and dataset root resolution
//! - Timestamp helpers

pub mod config;
pub mod error;
pub mod time;

pub use error::{Error, Result};
