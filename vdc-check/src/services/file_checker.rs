//! Duplicate / empty file detector
//!
//! Flags files by size and by name only. File contents are never read and
//! the dataset is never modified.

use crate::models::{FlagReason, FlaggedFile, Inventory, ScannedFile};
use crate::services::id_extractor::{self, ParsedName};
use std::path::Path;
use tracing::debug;
use vdc_common::config::SizeThresholds;

/// Size and naming checks over one inventory
#[derive(Debug, Clone, Default)]
pub struct FileChecker {
    thresholds: SizeThresholds,
}

impl FileChecker {
    pub fn new(thresholds: SizeThresholds) -> Self {
        Self { thresholds }
    }

    /// Flag every suspicious file of `inventory`, sorted by path
    pub fn check(&self, inventory: &Inventory) -> Vec<FlaggedFile> {
        let collection = inventory.collection;
        let min_size = collection.min_size(&self.thresholds);
        let mut flags = Vec::new();

        for file in &inventory.files {
            let parsed = id_extractor::extract(collection, &file.path).ok();

            if file.size == 0 {
                flags.push(self.flag(inventory, file, parsed.as_ref(), FlagReason::Empty));
            } else if file.size < min_size {
                flags.push(self.flag(
                    inventory,
                    file,
                    parsed.as_ref(),
                    FlagReason::Undersized { min_size },
                ));
            }

            if let Some(pattern) = duplicate_pattern(&file.path, parsed.as_ref()) {
                flags.push(self.flag(
                    inventory,
                    file,
                    parsed.as_ref(),
                    FlagReason::DuplicateName {
                        pattern: pattern.to_string(),
                    },
                ));
            }
        }

        for (video_id, holdings) in &inventory.entries {
            for (frame, files) in holdings.collisions() {
                debug!(
                    collection = %collection,
                    video_id = %video_id,
                    ?frame,
                    count = files.len(),
                    "Slot holds more than one file"
                );
                for file in files {
                    flags.push(FlaggedFile {
                        collection,
                        path: file.path.clone(),
                        size: file.size,
                        video_id: Some(video_id.clone()),
                        frame,
                        reason: FlagReason::Cardinality { count: files.len() },
                    });
                }
            }
        }

        // Stable: per-file flag order survives
        flags.sort_by(|a, b| a.path.cmp(&b.path));
        flags
    }

    fn flag(
        &self,
        inventory: &Inventory,
        file: &ScannedFile,
        parsed: Option<&ParsedName>,
        reason: FlagReason,
    ) -> FlaggedFile {
        FlaggedFile {
            collection: inventory.collection,
            path: file.path.clone(),
            size: file.size,
            video_id: parsed.map(|p| p.video_id.clone()),
            frame: parsed.and_then(|p| p.frame),
            reason,
        }
    }
}

/// Copy pattern on the part of the name after the id/frame prefix
///
/// Unparsed names are checked past any leading VideoId so that a bare
/// `L21_V001` never reads as `_v<N>`.
fn duplicate_pattern(path: &Path, parsed: Option<&ParsedName>) -> Option<&'static str> {
    match parsed {
        Some(parsed) => parsed
            .copy_marker
            .as_deref()
            .and_then(id_extractor::copy_pattern),
        None => path
            .file_stem()
            .and_then(|stem| {
                id_extractor::copy_pattern(id_extractor::after_id_prefix(&stem.to_string_lossy()))
            }),
    }
}
