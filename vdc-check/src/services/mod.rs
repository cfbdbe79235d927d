//! Scanning and checking services

pub mod collection_scanner;
pub mod file_checker;
pub mod id_extractor;
pub mod level_distribution;
pub mod metadata_check;
pub mod reconciler;

pub use collection_scanner::{scan_dataset, CollectionScanner};
pub use file_checker::FileChecker;
pub use id_extractor::{extract, NameError, ParsedName};
pub use level_distribution::{level_distribution, GapRange, LevelDistribution, LevelStats};
pub use metadata_check::{check_media_info, REQUIRED_MEDIA_FIELDS};
pub use reconciler::{reconcile, Reconciliation};
