//! Videos per level and gaps in each level's numbering

use crate::models::VideoId;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Inclusive run of video numbers with no video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GapRange {
    pub first: u32,
    pub last: u32,
}

impl GapRange {
    pub fn count(&self) -> u64 {
        u64::from(self.last - self.first) + 1
    }
}

impl fmt::Display for GapRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first == self.last {
            write!(f, "{}", self.first)
        } else {
            write!(f, "{}-{}", self.first, self.last)
        }
    }
}

/// Statistics for one level (`L21`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelStats {
    /// Distinct ids, so `L21_V01` and `L21_V001` count twice
    pub count: usize,
    pub max_sequence: u32,
    /// Numbers in `1..=max_sequence` with no video
    pub gaps: Vec<GapRange>,
    pub missing_numbers: u64,
}

/// Per-level counts keyed by level label
pub type LevelDistribution = BTreeMap<String, LevelStats>;

pub fn level_distribution<'a>(ids: impl IntoIterator<Item = &'a VideoId>) -> LevelDistribution {
    let mut levels: BTreeMap<String, (BTreeSet<&VideoId>, BTreeSet<u32>)> = BTreeMap::new();
    for id in ids {
        let (seen_ids, sequences) = levels.entry(id.level_label().to_string()).or_default();
        seen_ids.insert(id);
        sequences.insert(id.sequence());
    }

    levels
        .into_iter()
        .map(|(level, (seen_ids, sequences))| {
            let gaps = gap_ranges(&sequences);
            let stats = LevelStats {
                count: seen_ids.len(),
                max_sequence: sequences.iter().next_back().copied().unwrap_or(0),
                missing_numbers: gaps.iter().map(GapRange::count).sum(),
                gaps,
            };
            (level, stats)
        })
        .collect()
}

/// Walk consecutive numbers; work is linear in the number of videos
fn gap_ranges(sequences: &BTreeSet<u32>) -> Vec<GapRange> {
    let mut gaps = Vec::new();
    let mut next_expected: u32 = 1;
    for &sequence in sequences {
        if sequence > next_expected {
            gaps.push(GapRange {
                first: next_expected,
                last: sequence - 1,
            });
        }
        next_expected = next_expected.max(sequence.saturating_add(1));
    }
    gaps
}
