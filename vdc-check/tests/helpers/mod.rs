//! Test Helper Utilities
//!
//! Shared utilities for testing vdc-check

pub mod dataset_builder;

pub use dataset_builder::{media_info_json, objects_json, DatasetBuilder};
