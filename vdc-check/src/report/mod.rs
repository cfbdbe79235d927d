//! Validation report
//!
//! [`ValidationReport`] is the single structured result of a run. The console
//! summary, the JSON result file and the Markdown missing-files report are
//! all renderings of it.

pub mod markdown;
pub mod summary;

use crate::error::CheckResult;
use crate::models::{
    Collection, DiscrepancyRecord, FlaggedFile, FrameAlignment, Inventory,
    MetadataIssue, Orphan, ScanWarning, VideoId,
};
use crate::services::{level_distribution, LevelDistribution, Reconciliation};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// JSON result file name inside the reports directory
pub const RESULTS_FILE: &str = "validation_results.json";
/// Markdown missing-files report name inside the reports directory
pub const MISSING_FILES_REPORT: &str = "missing_files_report.md";

/// Verdict of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OverallStatus {
    #[serde(rename = "PASS")]
    Pass,
    #[serde(rename = "ISSUES_FOUND")]
    IssuesFound,
}

impl OverallStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OverallStatus::Pass => "PASS",
            OverallStatus::IssuesFound => "ISSUES_FOUND",
        }
    }

    /// Process exit code for this verdict
    pub fn exit_code(self) -> i32 {
        match self {
            OverallStatus::Pass => 0,
            OverallStatus::IssuesFound => 1,
        }
    }
}

/// File counts for one collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionCount {
    pub collection: Collection,
    pub directory: PathBuf,
    pub present: bool,
    pub files: usize,
    pub videos: usize,
    pub total_size: u64,
}

/// Frames per video in one frame-indexed collection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameStats {
    pub collection: Collection,
    pub videos: usize,
    pub total_frames: usize,
    pub average_per_video: f64,
    pub min_per_video: usize,
    pub max_per_video: usize,
}

impl FrameStats {
    /// `None` for flat collections
    pub fn from_inventory(inventory: &Inventory) -> Option<Self> {
        if !inventory.collection.is_frame_indexed() {
            return None;
        }
        let counts: Vec<usize> = inventory
            .entries
            .values()
            .map(|holdings| holdings.frame_indices().map_or(0, |frames| frames.len()))
            .collect();
        let total_frames: usize = counts.iter().sum();
        let average_per_video = if counts.is_empty() {
            0.0
        } else {
            total_frames as f64 / counts.len() as f64
        };
        Some(Self {
            collection: inventory.collection,
            videos: counts.len(),
            total_frames,
            average_per_video,
            min_per_video: counts.iter().copied().min().unwrap_or(0),
            max_per_video: counts.iter().copied().max().unwrap_or(0),
        })
    }
}

/// Totals and verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_files: usize,
    pub total_videos: usize,
    pub passing_videos: usize,
    pub videos_with_issues: usize,
    /// Missing (video, collection) pairs
    pub total_missing_files: usize,
    pub missing_by_collection: BTreeMap<Collection, usize>,
    pub total_frame_mismatches: usize,
    pub total_flagged_files: usize,
    pub flags_by_reason: BTreeMap<String, usize>,
    pub total_metadata_issues: usize,
    pub total_orphans: usize,
    pub total_scan_warnings: usize,
    pub structure_issues_count: usize,
    pub overall_status: OverallStatus,
}

/// Complete result of one validation run
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub validation_time: DateTime<Utc>,
    pub data_path: PathBuf,
    pub file_counts: Vec<CollectionCount>,
    /// Keyframe and Objects frames per video
    pub frame_statistics: Vec<FrameStats>,
    pub total_videos: usize,
    pub level_distribution: LevelDistribution,
    /// Ids with at least one finding, sorted
    pub records: Vec<DiscrepancyRecord>,
    pub passing_videos: usize,
    pub orphans: Vec<Orphan>,
    pub flagged_files: Vec<FlaggedFile>,
    pub metadata_issues: Vec<MetadataIssue>,
    pub scan_warnings: Vec<ScanWarning>,
    /// Missing collection directories
    pub structure_issues: Vec<String>,
    /// Keyframe/Objects pairing chosen per video
    pub frame_alignments: BTreeMap<VideoId, FrameAlignment>,
    pub summary: Summary,
}

impl ValidationReport {
    /// Assemble the report
    ///
    /// `reconciliation` must already carry the flags and metadata issues
    /// (see [`Reconciliation::attach_flags`]); `flags` and `metadata_issues`
    /// are kept as the global lists.
    pub fn build(
        dataset_root: &Path,
        inventories: &[Inventory],
        reconciliation: Reconciliation,
        flags: Vec<FlaggedFile>,
        metadata_issues: Vec<MetadataIssue>,
    ) -> Self {
        let file_counts: Vec<CollectionCount> = inventories
            .iter()
            .map(|inv| CollectionCount {
                collection: inv.collection,
                directory: inv.root.clone(),
                present: inv.present,
                files: inv.file_count(),
                videos: inv.entries.len(),
                total_size: inv.total_size(),
            })
            .collect();

        let frame_statistics: Vec<FrameStats> = inventories
            .iter()
            .filter_map(FrameStats::from_inventory)
            .collect();

        let structure_issues: Vec<String> = inventories
            .iter()
            .filter(|inv| !inv.present)
            .map(|inv| format!("Directory not found: {}", inv.root.display()))
            .collect();

        let scan_warnings: Vec<ScanWarning> = inventories
            .iter()
            .flat_map(|inv| inv.warnings.iter().cloned())
            .collect();

        let Reconciliation {
            video_ids,
            records,
            alignments,
            orphans,
        } = reconciliation;
        let records: Vec<DiscrepancyRecord> = records.into_values().collect();

        let mut missing_by_collection = BTreeMap::new();
        for record in &records {
            for collection in &record.missing {
                *missing_by_collection.entry(*collection).or_insert(0) += 1;
            }
        }

        let mut flags_by_reason = BTreeMap::new();
        for flag in &flags {
            *flags_by_reason
                .entry(flag.reason.tag().to_string())
                .or_insert(0) += 1;
        }

        let total_missing_files: usize = missing_by_collection.values().sum();
        let total_frame_mismatches = records
            .iter()
            .filter(|r| r.frame_mismatch.is_some())
            .count();

        let failed = total_missing_files > 0
            || total_frame_mismatches > 0
            || !flags.is_empty()
            || !metadata_issues.is_empty()
            || !structure_issues.is_empty();
        let overall_status = if failed {
            OverallStatus::IssuesFound
        } else {
            OverallStatus::Pass
        };

        let summary = Summary {
            total_files: file_counts.iter().map(|c| c.files).sum(),
            total_videos: video_ids.len(),
            passing_videos: video_ids.len().saturating_sub(records.len()),
            videos_with_issues: records.len(),
            total_missing_files,
            missing_by_collection,
            total_frame_mismatches,
            total_flagged_files: flags.len(),
            flags_by_reason,
            total_metadata_issues: metadata_issues.len(),
            total_orphans: orphans.len(),
            total_scan_warnings: scan_warnings.len(),
            structure_issues_count: structure_issues.len(),
            overall_status,
        };

        Self {
            validation_time: vdc_common::time::now(),
            data_path: dataset_root.to_path_buf(),
            file_counts,
            frame_statistics,
            total_videos: video_ids.len(),
            level_distribution: level_distribution(&video_ids),
            passing_videos: summary.passing_videos,
            records,
            orphans,
            flagged_files: flags,
            metadata_issues,
            scan_warnings,
            structure_issues,
            frame_alignments: alignments,
            summary,
        }
    }

    pub fn overall_status(&self) -> OverallStatus {
        self.summary.overall_status
    }

    /// Ids lacking `collection`, sorted
    pub fn missing_from(&self, collection: Collection) -> Vec<&VideoId> {
        self.records
            .iter()
            .filter(|r| r.missing.contains(&collection))
            .map(|r| &r.video_id)
            .collect()
    }
}

/// Where the report files were written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub results_json: PathBuf,
    pub missing_files_markdown: PathBuf,
}

/// Write the JSON result file and the Markdown missing-files report
pub fn write_reports(report: &ValidationReport, reports_dir: &Path) -> CheckResult<ReportPaths> {
    std::fs::create_dir_all(reports_dir)?;

    let results_json = reports_dir.join(RESULTS_FILE);
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(&results_json, json)?;
    info!("Results saved to: {}", results_json.display());

    let missing_files_markdown = reports_dir.join(MISSING_FILES_REPORT);
    std::fs::write(&missing_files_markdown, markdown::render_missing_files(report))?;
    info!("Missing files report saved to: {}", missing_files_markdown.display());

    Ok(ReportPaths {
        results_json,
        missing_files_markdown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FlagReason, ScannedFile};
    use crate::services::reconcile;
    use tempfile::TempDir;

    fn id(text: &str) -> VideoId {
        VideoId::parse(text).unwrap()
    }

    #[test]
    fn test_frame_stats_per_frame_collection() {
        let mut keyframes = Inventory::new(Collection::Keyframe, PathBuf::from("keyframes"));
        for (text, frames) in [("L21_V001", 1..=4u32), ("L21_V002", 1..=2u32)] {
            for frame in frames {
                let file = ScannedFile {
                    path: PathBuf::from(format!("keyframes/{}/{:03}.jpg", text, frame)),
                    size: 4096,
                };
                keyframes.insert(id(text), Some(frame), file);
            }
        }

        let stats = FrameStats::from_inventory(&keyframes).unwrap();
        assert_eq!(stats.videos, 2);
        assert_eq!(stats.total_frames, 6);
        assert_eq!(stats.average_per_video, 3.0);
        assert_eq!((stats.min_per_video, stats.max_per_video), (2, 4));

        let video = Inventory::new(Collection::Video, PathBuf::from("video"));
        assert!(FrameStats::from_inventory(&video).is_none());

        let empty = Inventory::new(Collection::Objects, PathBuf::from("objects"));
        let stats = FrameStats::from_inventory(&empty).unwrap();
        assert_eq!((stats.total_frames, stats.average_per_video), (0, 0.0));
    }

    fn inventories(ids_per_collection: &[(Collection, &[&str])]) -> Vec<Inventory> {
        ids_per_collection
            .iter()
            .map(|(collection, ids)| {
                let mut inv = Inventory::new(*collection, PathBuf::from(collection.dir_name()));
                inv.present = true;
                for text in ids.iter() {
                    let file = ScannedFile {
                        path: PathBuf::from(format!("{}/{}", collection.dir_name(), text)),
                        size: 4096,
                    };
                    let frame = collection.is_frame_indexed().then_some(1);
                    inv.insert(id(text), frame, file.clone());
                    inv.files.push(file);
                }
                inv
            })
            .collect()
    }

    fn all_with(ids: &'static [&'static str]) -> Vec<Inventory> {
        let table: Vec<(Collection, &[&str])> =
            Collection::ALL.iter().map(|c| (*c, ids)).collect();
        inventories(&table)
    }

    #[test]
    fn test_complete_dataset_passes() {
        let invs = all_with(&["L21_V001", "L21_V002"]);
        let report =
            ValidationReport::build(Path::new("/d"), &invs, reconcile(&invs), vec![], vec![]);

        assert_eq!(report.overall_status(), OverallStatus::Pass);
        assert_eq!(report.summary.total_files, 12);
        assert_eq!(report.passing_videos, 2);
        assert!(report.records.is_empty());
        assert_eq!(report.level_distribution["L21"].count, 2);
    }

    #[test]
    fn test_missing_directory_is_structure_issue() {
        let mut invs = all_with(&["L21_V001"]);
        invs[2] = Inventory::new(Collection::Feature, PathBuf::from("/d/clip-features-32"));

        let report =
            ValidationReport::build(Path::new("/d"), &invs, reconcile(&invs), vec![], vec![]);
        assert_eq!(report.overall_status(), OverallStatus::IssuesFound);
        assert_eq!(report.structure_issues.len(), 1);
        assert_eq!(report.summary.missing_by_collection[&Collection::Feature], 1);
        assert_eq!(report.missing_from(Collection::Feature), vec![&id("L21_V001")]);
    }

    #[test]
    fn test_orphans_alone_do_not_fail() {
        let mut invs = all_with(&["L21_V001"]);
        invs[0].unparseable.push(crate::models::UnparsedFile {
            file: ScannedFile {
                path: PathBuf::from("video/trailer.mp4"),
                size: 4096,
            },
            reason: "unrecognized file name: trailer.mp4".to_string(),
        });

        let report =
            ValidationReport::build(Path::new("/d"), &invs, reconcile(&invs), vec![], vec![]);
        assert_eq!(report.overall_status(), OverallStatus::Pass);
        assert_eq!(report.summary.total_orphans, 1);
    }

    #[test]
    fn test_flags_fail_and_are_counted_by_reason() {
        let invs = all_with(&["L21_V001"]);
        let flag = FlaggedFile {
            collection: Collection::Video,
            path: PathBuf::from("video/L21_V001"),
            size: 0,
            video_id: Some(id("L21_V001")),
            frame: None,
            reason: FlagReason::Empty,
        };
        let mut reconciliation = reconcile(&invs);
        reconciliation.attach_flags(std::slice::from_ref(&flag));

        let report = ValidationReport::build(Path::new("/d"), &invs, reconciliation, vec![flag], vec![]);
        assert_eq!(report.overall_status(), OverallStatus::IssuesFound);
        assert_eq!(report.summary.flags_by_reason["empty"], 1);
        assert_eq!(report.flagged_files[0].reason, FlagReason::Empty);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.passing_videos, 0);
    }

    #[test]
    fn test_write_reports_creates_both_files() {
        let temp_dir = TempDir::new().unwrap();
        let reports_dir = temp_dir.path().join("nested").join("reports");
        let invs = all_with(&["L21_V001"]);
        let report =
            ValidationReport::build(Path::new("/d"), &invs, reconcile(&invs), vec![], vec![]);

        let paths = write_reports(&report, &reports_dir).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&paths.results_json).unwrap()).unwrap();
        assert_eq!(json["summary"]["overall_status"], "PASS");
        assert_eq!(json["frame_alignments"]["L21_V001"], "direct");
        assert!(paths.missing_files_markdown.exists());
    }
}
