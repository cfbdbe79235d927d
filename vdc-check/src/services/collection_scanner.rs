//! Collection scanner
//!
//! Walks one collection directory and builds its [`Inventory`].
//!
//! Two-phase scanning:
//! - Phase 1: Sequential directory traversal, following symlinks (walkdir
//!   reports loops and dangling links as errors)
//! - Phase 2: Parallel `stat` of every candidate file (rayon)
//!
//! Unreadable entries, dangling symlinks and symlink loops never abort a
//! scan. They are logged and recorded as [`ScanWarning`]s on the inventory.

use crate::error::CheckError;
use crate::models::{Collection, Inventory, ScanWarning, ScannedFile, UnparsedFile};
use crate::services::id_extractor;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Collection scanner
#[derive(Debug, Clone)]
pub struct CollectionScanner {
    ignore_patterns: Vec<String>,
}

impl CollectionScanner {
    /// Create new scanner with default ignore patterns
    ///
    /// Ignores system files like .DS_Store, Thumbs.db, .git, etc.
    pub fn new() -> Self {
        Self {
            ignore_patterns: vec![
                ".DS_Store".to_string(),
                "Thumbs.db".to_string(),
                "desktop.ini".to_string(),
                ".git".to_string(),
                ".svn".to_string(),
            ],
        }
    }

    /// Scan `<dataset_root>/<collection dir>` into an inventory
    ///
    /// Never fails: a missing directory yields an inventory with
    /// `present == false`, unreadable entries become warnings and unparseable
    /// names become `unparseable` entries. Output is sorted by path, so two
    /// scans of an unchanged tree are equal.
    pub fn scan(&self, dataset_root: &Path, collection: Collection) -> Inventory {
        let root = dataset_root.join(collection.dir_name());
        let mut inventory = Inventory::new(collection, root.clone());

        if !root.is_dir() {
            tracing::warn!(
                collection = %collection,
                path = %root.display(),
                "Collection directory not found"
            );
            return inventory;
        }
        inventory.present = true;

        // Phase 1: Sequential directory traversal
        let mut candidates = self.walk(&root, collection, &mut inventory.warnings);
        candidates.sort();

        tracing::debug!(
            collection = %collection,
            candidates = candidates.len(),
            "Phase 1 complete"
        );

        // Phase 2: Parallel stat, each thread reads a different file
        let stats: Vec<Result<ScannedFile, ScanWarning>> = candidates
            .par_iter()
            .map(|path| stat_file(collection, path))
            .collect();

        for stat in stats {
            match stat {
                Ok(file) => inventory.files.push(file),
                Err(warning) => inventory.warnings.push(warning),
            }
        }

        let files = std::mem::take(&mut inventory.files);
        for file in &files {
            match id_extractor::extract(collection, &file.path) {
                Ok(parsed) => inventory.insert(parsed.video_id, parsed.frame, file.clone()),
                Err(reason) => {
                    tracing::debug!(
                        collection = %collection,
                        path = %file.path.display(),
                        %reason,
                        "Unparseable file name"
                    );
                    inventory.unparseable.push(UnparsedFile {
                        file: file.clone(),
                        reason: reason.to_string(),
                    });
                }
            }
        }
        inventory.files = files;

        tracing::info!(
            collection = %collection,
            files = inventory.files.len(),
            videos = inventory.entries.len(),
            unparseable = inventory.unparseable.len(),
            warnings = inventory.warnings.len(),
            "Scanned collection"
        );

        inventory
    }

    fn walk(
        &self,
        root: &Path,
        collection: Collection,
        warnings: &mut Vec<ScanWarning>,
    ) -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        // Symlinked per-video directories and files are real artifacts
        let walker = WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| self.should_process_entry(e));

        for entry in walker {
            match entry {
                Ok(entry) => {
                    // With follow_links the file type is the link target's
                    if entry.file_type().is_file() {
                        candidates.push(entry.path().to_path_buf());
                    } else if !entry.file_type().is_dir() {
                        tracing::warn!(
                            collection = %collection,
                            path = %entry.path().display(),
                            "Skipping entry that is neither a file nor a directory"
                        );
                        warnings.push(ScanWarning {
                            collection,
                            path: Some(entry.path().to_path_buf()),
                            message: "not a regular file or directory".to_string(),
                        });
                    }
                }
                Err(e) => {
                    // Loops, dangling links and unreadable entries; continue scanning
                    tracing::warn!(collection = %collection, "Error accessing entry: {}", e);
                    warnings.push(ScanWarning {
                        collection,
                        path: e.path().map(Path::to_path_buf),
                        message: e.to_string(),
                    });
                }
            }
        }

        candidates
    }

    /// Check if entry should be processed
    fn should_process_entry(&self, entry: &DirEntry) -> bool {
        let file_name = entry.file_name().to_string_lossy();
        !self
            .ignore_patterns
            .iter()
            .any(|pattern| file_name == pattern.as_str())
    }
}

impl Default for CollectionScanner {
    fn default() -> Self {
        Self::new()
    }
}

fn stat_file(collection: Collection, path: &Path) -> Result<ScannedFile, ScanWarning> {
    std::fs::metadata(path)
        .map(|meta| ScannedFile {
            path: path.to_path_buf(),
            size: meta.len(),
        })
        .map_err(|e| {
            let err = CheckError::FileAccess(path.to_path_buf(), e.to_string());
            tracing::warn!("{}", err);
            ScanWarning {
                collection,
                path: Some(path.to_path_buf()),
                message: err.to_string(),
            }
        })
}

/// Scan all six collections concurrently
///
/// Each scan runs on the blocking pool and owns its inventory; the join
/// below is the barrier before reconciliation. Inventories come back in
/// [`Collection::ALL`] order.
pub async fn scan_dataset(
    dataset_root: &Path,
    scanner: &CollectionScanner,
) -> Result<Vec<Inventory>, CheckError> {
    let handles: Vec<_> = Collection::ALL
        .iter()
        .map(|&collection| {
            let root = dataset_root.to_path_buf();
            let scanner = scanner.clone();
            tokio::task::spawn_blocking(move || scanner.scan(&root, collection))
        })
        .collect();

    let mut inventories = Vec::with_capacity(handles.len());
    for joined in futures::future::join_all(handles).await {
        let inventory =
            joined.map_err(|e| CheckError::TaskFailed(format!("Collection scan task failed: {}", e)))?;
        inventories.push(inventory);
    }

    Ok(inventories)
}
