//! Markdown missing-files report

use super::ValidationReport;
use crate::models::Collection;
use std::fmt::Write;

/// Every missing artifact, grouped by collection, one row per video
pub fn render_missing_files(report: &ValidationReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Missing Files Report\n");
    let _ = writeln!(out, "Generated: {}", report.validation_time.to_rfc3339());
    let _ = writeln!(out, "Dataset root: {}\n", report.data_path.display());

    if report.summary.total_missing_files == 0 {
        let _ = writeln!(out, "## No Missing Files\n");
        let _ = writeln!(out, "Every video has its files in all collections.");
    } else {
        let _ = writeln!(out, "## Missing Files Summary\n");
        for collection in Collection::ALL {
            let missing = report.missing_from(collection);
            if missing.is_empty() {
                continue;
            }
            let _ = writeln!(out, "### {}", collection.label());
            let _ = writeln!(out, "- **Missing for {} videos**\n", missing.len());
            let _ = writeln!(out, "| Video | Status |");
            let _ = writeln!(out, "|-------|--------|");
            for video_id in missing {
                let _ = writeln!(out, "| {} | Missing |", video_id);
            }
            let _ = writeln!(out);
        }
    }

    if !report.structure_issues.is_empty() {
        let _ = writeln!(out, "\n## Structure Issues\n");
        for issue in &report.structure_issues {
            let _ = writeln!(out, "- {}", issue);
        }
    }

    out
}
