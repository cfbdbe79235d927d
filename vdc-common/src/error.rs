//! Common error types for VDC

use thiserror::Error;

/// Common result type for VDC operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across VDC crates
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
