//! Console summary

use super::{OverallStatus, ValidationReport};
use crate::models::{Collection, FrameAlignment};
use std::fmt;

const RULE_WIDTH: usize = 80;
/// Records listed in full before the summary truncates
const RECORD_PREVIEW: usize = 10;
/// Gap ranges listed per level before the summary truncates
const GAP_PREVIEW: usize = 10;

/// Render the human-readable run summary
pub fn render(report: &ValidationReport) -> String {
    ConsoleSummary(report).to_string()
}

/// Display adapter writing the console summary of a report
pub struct ConsoleSummary<'a>(pub &'a ValidationReport);

impl fmt::Display for ConsoleSummary<'_> {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let summary = &report.summary;
        let rule = "=".repeat(RULE_WIDTH);

        writeln!(out, "{}", rule)?;
        writeln!(out, "DATASET VALIDATION REPORT")?;
        writeln!(out, "{}", rule)?;
        writeln!(out, "Dataset root: {}", report.data_path.display())?;
        writeln!(out, "Validated at: {}", report.validation_time.to_rfc3339())?;
        writeln!(out)?;

        writeln!(out, "SUMMARY:")?;
        writeln!(out, "  Total files:         {}", summary.total_files)?;
        writeln!(out, "  Total videos:        {}", summary.total_videos)?;
        writeln!(out, "  Passing videos:      {}", summary.passing_videos)?;
        writeln!(out, "  Videos with issues:  {}", summary.videos_with_issues)?;
        writeln!(out, "  Missing files:       {}", summary.total_missing_files)?;
        writeln!(out, "  Frame mismatches:    {}", summary.total_frame_mismatches)?;
        writeln!(out, "  Flagged files:       {}", summary.total_flagged_files)?;
        writeln!(out, "  Metadata issues:     {}", summary.total_metadata_issues)?;
        writeln!(out, "  Orphan files:        {}", summary.total_orphans)?;
        writeln!(out, "  Scan warnings:       {}", summary.total_scan_warnings)?;
        writeln!(out, "  Structure issues:    {}", summary.structure_issues_count)?;
        writeln!(out)?;

        writeln!(out, "FILES PER COLLECTION:")?;
        for count in &report.file_counts {
            let note = if count.present { "" } else { " (directory missing)" };
            writeln!(
                out,
                "  {:<12} {:>8} files, {:>6} videos{}",
                count.collection.label(),
                count.files,
                count.videos,
                note
            )?;
        }
        writeln!(out)?;

        writeln!(out, "FRAMES PER VIDEO:")?;
        for stats in &report.frame_statistics {
            if stats.videos == 0 {
                writeln!(out, "  {}: no videos", stats.collection.label())?;
                continue;
            }
            writeln!(
                out,
                "  {}: {} frames over {} videos (avg {:.1}, min {}, max {})",
                stats.collection.label(),
                stats.total_frames,
                stats.videos,
                stats.average_per_video,
                stats.min_per_video,
                stats.max_per_video
            )?;
        }
        writeln!(out)?;

        writeln!(out, "CROSS-DIRECTORY CONSISTENCY:")?;
        if summary.missing_by_collection.is_empty() {
            writeln!(out, "  All videos are present in every collection")?;
        } else {
            for collection in Collection::ALL {
                if let Some(count) = summary.missing_by_collection.get(&collection) {
                    writeln!(out, "  {}: {} videos missing", collection.label(), count)?;
                }
            }
        }
        let shifted = report
            .frame_alignments
            .values()
            .filter(|a| a.is_shifted())
            .count();
        let unaligned = report
            .frame_alignments
            .values()
            .filter(|a| **a == FrameAlignment::Unaligned)
            .count();
        if shifted > 0 {
            writeln!(out, "  Keyframe/objects numbering offset by one: {} videos", shifted)?;
        }
        if unaligned > 0 {
            writeln!(out, "  Keyframe/objects frame sets disagree: {} videos", unaligned)?;
        }
        writeln!(out)?;

        writeln!(out, "FLAGGED FILES:")?;
        if summary.flags_by_reason.is_empty() {
            writeln!(out, "  No empty, undersized or duplicate files")?;
        } else {
            for (reason, count) in &summary.flags_by_reason {
                writeln!(out, "  {}: {}", reason, count)?;
            }
        }
        writeln!(out)?;

        writeln!(out, "LEVEL DISTRIBUTION:")?;
        for (level, stats) in &report.level_distribution {
            writeln!(out, "  {}: {} videos", level, stats.count)?;
        }
        let gapped: Vec<_> = report
            .level_distribution
            .iter()
            .filter(|(_, stats)| !stats.gaps.is_empty())
            .collect();
        if !gapped.is_empty() {
            writeln!(out, "  Gaps in video numbering:")?;
            for (level, stats) in gapped {
                let shown: Vec<String> = stats
                    .gaps
                    .iter()
                    .take(GAP_PREVIEW)
                    .map(ToString::to_string)
                    .collect();
                let more = if stats.gaps.len() > GAP_PREVIEW { ", ..." } else { "" };
                writeln!(
                    out,
                    "    {}: missing {}{} ({} numbers)",
                    level,
                    shown.join(", "),
                    more,
                    stats.missing_numbers
                )?;
            }
        }
        writeln!(out)?;

        if !report.records.is_empty() {
            writeln!(out, "DISCREPANCIES:")?;
            for record in report.records.iter().take(RECORD_PREVIEW) {
                let mut parts = Vec::new();
                if !record.missing.is_empty() {
                    let labels: Vec<&str> = record.missing.iter().map(|c| c.label()).collect();
                    parts.push(format!("missing {}", labels.join(", ")));
                }
                if let Some(mismatch) = &record.frame_mismatch {
                    parts.push(format!("{} unmatched frames", mismatch.len()));
                }
                if !record.flagged.is_empty() {
                    parts.push(format!("{} flagged files", record.flagged.len()));
                }
                if let Some(issue) = &record.metadata {
                    parts.push(format!("metadata lacks {}", issue.missing_fields.join(", ")));
                }
                writeln!(out, "  - {}: {}", record.video_id, parts.join("; "))?;
            }
            if report.records.len() > RECORD_PREVIEW {
                writeln!(out, "  ... and {} more", report.records.len() - RECORD_PREVIEW)?;
            }
            writeln!(out)?;
        }

        if !report.structure_issues.is_empty() {
            writeln!(out, "STRUCTURE ISSUES:")?;
            for issue in &report.structure_issues {
                writeln!(out, "  - {}", issue)?;
            }
            writeln!(out)?;
        }

        writeln!(out, "VERDICT: {}", summary.overall_status.as_str())?;
        match summary.overall_status {
            OverallStatus::Pass => writeln!(out, "  Every video is complete in all six collections")?,
            OverallStatus::IssuesFound => writeln!(out, "  Issues found, see the reports for details")?,
        }
        writeln!(out, "{}", rule)
    }
}
