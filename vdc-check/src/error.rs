//! Error types for vdc-check
//!
//! Only the root-folder variants are fatal. Everything met while walking the
//! dataset is collected as a warning or an orphan and reported instead.

use std::path::PathBuf;
use thiserror::Error;

/// Checker error type
#[derive(Debug, Error)]
pub enum CheckError {
    /// Dataset root does not exist
    #[error("Dataset root not found: {}", .0.display())]
    RootNotFound(PathBuf),

    /// Dataset root exists but is a file
    #[error("Dataset root is not a directory: {}", .0.display())]
    RootNotADirectory(PathBuf),

    /// Dataset root cannot be listed
    #[error("Dataset root is not readable: {}: {1}", .0.display())]
    RootNotReadable(PathBuf, String),

    /// One file could not be accessed
    #[error("File access error: {}: {1}", .0.display())]
    FileAccess(PathBuf, String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image decode/encode error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Blocking task panicked or was cancelled
    #[error("Task failed: {0}")]
    TaskFailed(String),

    /// vdc-common error
    #[error("Common error: {0}")]
    Common(#[from] vdc_common::Error),
}

impl CheckError {
    /// Configuration errors that stop the run before any scan (exit code 2)
    pub fn is_fatal_config(&self) -> bool {
        matches!(
            self,
            CheckError::RootNotFound(_)
                | CheckError::RootNotADirectory(_)
                | CheckError::RootNotReadable(..)
                | CheckError::Common(vdc_common::Error::Config(_))
        )
    }
}

/// Result type for checker operations
pub type CheckResult<T> = std::result::Result<T, CheckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_config_classification() {
        assert!(CheckError::RootNotFound(PathBuf::from("/nope")).is_fatal_config());
        assert!(CheckError::RootNotADirectory(PathBuf::from("/etc/hosts")).is_fatal_config());
        assert!(CheckError::Common(vdc_common::Error::Config("bad".into())).is_fatal_config());
        assert!(!CheckError::TaskFailed("panic".into()).is_fatal_config());
        assert!(!CheckError::FileAccess(PathBuf::from("a"), "denied".into()).is_fatal_config());
    }

    #[test]
    fn test_messages_include_path() {
        let err = CheckError::RootNotFound(PathBuf::from("/data/set"));
        assert_eq!(err.to_string(), "Dataset root not found: /data/set");
        let err = CheckError::FileAccess(PathBuf::from("video/a.mp4"), "denied".into());
        assert_eq!(err.to_string(), "File access error: video/a.mp4: denied");
    }
}
