//! vdc-check library
//!
//! Cross-collection consistency checker for a video dataset split across six
//! parallel directory trees (videos, keyframes, features, keyframe maps, media
//! info, object detections).
//!
//! Pipeline: concurrent scans → reconciliation → file and metadata checks →
//! [`report::ValidationReport`] → report files. The optional quality sampler
//! runs after the checks and never changes the verdict.

pub mod error;
pub mod models;
pub mod report;
pub mod sampler;
pub mod services;

pub use error::{CheckError, CheckResult};

use crate::models::{Collection, Inventory};
use crate::report::{ReportPaths, ValidationReport};
use crate::sampler::{QualitySummary, SamplerOptions};
use crate::services::{check_media_info, reconcile, scan_dataset, CollectionScanner, FileChecker};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};
use vdc_common::config::SizeThresholds;

/// Everything one validation run needs
#[derive(Debug, Clone)]
pub struct CheckOptions {
    pub dataset_root: PathBuf,
    /// `None` skips writing report files
    pub reports_dir: Option<PathBuf>,
    pub thresholds: SizeThresholds,
    /// `None` disables the quality sampler
    pub sampler: Option<SamplerOptions>,
}

impl CheckOptions {
    pub fn new(dataset_root: impl Into<PathBuf>) -> Self {
        Self {
            dataset_root: dataset_root.into(),
            reports_dir: None,
            thresholds: SizeThresholds::default(),
            sampler: None,
        }
    }
}

/// Result of [`run_validation`]
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub report: ValidationReport,
    /// Set when the report files were written
    pub report_paths: Option<ReportPaths>,
    pub quality: Option<QualitySummary>,
}

/// Confirm the dataset root can be scanned at all
pub fn validate_root(root: &Path) -> CheckResult<()> {
    if !root.exists() {
        return Err(CheckError::RootNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(CheckError::RootNotADirectory(root.to_path_buf()));
    }
    std::fs::read_dir(root)
        .map(|_| ())
        .map_err(|e| CheckError::RootNotReadable(root.to_path_buf(), e.to_string()))
}

/// Run one full validation pass
///
/// Fails only on a fatal configuration problem (unusable root) or an internal
/// task failure. Report-writing and sampler failures are logged and leave the
/// verdict untouched.
pub async fn run_validation(options: &CheckOptions) -> CheckResult<CheckOutcome> {
    let started = Instant::now();
    let root = options.dataset_root.as_path();
    validate_root(root)?;
    info!("Validating dataset at {}", root.display());

    let inventories = scan_dataset(root, &CollectionScanner::new()).await?;
    info!(
        "Scan complete in {}",
        vdc_common::time::format_elapsed(started.elapsed())
    );

    let checker = FileChecker::new(options.thresholds.clone());
    let flags: Vec<_> = inventories
        .iter()
        .flat_map(|inventory| checker.check(inventory))
        .collect();

    let media_info = inventories
        .iter()
        .find(|inv| inv.collection == Collection::MediaInfo)
        .cloned();
    let metadata_issues = match media_info {
        Some(inventory) => tokio::task::spawn_blocking(move || check_media_info(&inventory))
            .await
            .map_err(|e| CheckError::TaskFailed(format!("MediaInfo check task failed: {}", e)))?,
        None => Vec::new(),
    };

    let mut reconciliation = reconcile(&inventories);
    reconciliation.attach_flags(&flags);
    reconciliation.attach_metadata_issues(&metadata_issues);

    let quality = match &options.sampler {
        Some(sampler_options) => {
            run_sampler(&inventories, &reconciliation, sampler_options.clone()).await
        }
        None => None,
    };

    let report = ValidationReport::build(root, &inventories, reconciliation, flags, metadata_issues);

    let report_paths = options.reports_dir.as_deref().and_then(|dir| {
        crate::report::write_reports(&report, dir)
            .map_err(|e| warn!("Failed to write reports to {}: {}", dir.display(), e))
            .ok()
    });

    info!(
        status = report.overall_status().as_str(),
        videos = report.total_videos,
        issues = report.records.len(),
        "Validation finished in {}",
        vdc_common::time::format_elapsed(started.elapsed())
    );

    Ok(CheckOutcome {
        report,
        report_paths,
        quality,
    })
}

async fn run_sampler(
    inventories: &[Inventory],
    reconciliation: &services::Reconciliation,
    options: SamplerOptions,
) -> Option<QualitySummary> {
    let inventories = inventories.to_vec();
    let reconciliation = reconciliation.clone();
    let joined =
        tokio::task::spawn_blocking(move || sampler::run(&inventories, &reconciliation, &options))
            .await;

    match joined {
        Ok(Ok(summary)) => Some(summary),
        Ok(Err(e)) => {
            warn!("Quality sampler failed: {}", e);
            None
        }
        Err(e) => {
            warn!("Quality sampler task failed: {}", e);
            None
        }
    }
}
