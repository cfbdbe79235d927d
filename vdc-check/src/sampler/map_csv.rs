//! Keyframe timing map (`map-keyframes/<id>.csv`)
//!
//! Columns are located by header name (`n`, `pts_time`, `fps`, `frame_idx`),
//! so their order does not matter and extra columns are ignored. A cell that
//! does not parse is treated as absent.

use crate::error::CheckResult;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// One row of a map CSV
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MapRow {
    /// Keyframe number
    pub n: Option<u32>,
    pub pts_time: Option<f64>,
    pub fps: Option<f64>,
    /// Frame index in the source video
    pub frame_idx: Option<u32>,
}

impl MapRow {
    /// `pts_time`, else `frame_idx / fps`
    pub fn display_time(&self) -> Option<f64> {
        self.pts_time.or_else(|| match (self.frame_idx, self.fps) {
            (Some(frame_idx), Some(fps)) if fps > 0.0 => Some(f64::from(frame_idx) / fps),
            _ => None,
        })
    }
}

/// Which column a lookup matched on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    N,
    FrameIdx,
}

/// Successful lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapMatch<'a> {
    pub row: &'a MapRow,
    pub kind: MatchKind,
    /// 0 when matched on the keyframe number itself, 1 when on the number before it
    pub offset: u32,
}

/// Rows of one map CSV indexed by `n` and by `frame_idx`
#[derive(Debug, Clone, Default)]
pub struct MapIndex {
    by_n: HashMap<u32, MapRow>,
    by_frame_idx: HashMap<u32, MapRow>,
}

impl MapIndex {
    pub fn load(path: &Path) -> CheckResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    pub fn parse(text: &str) -> Self {
        let mut index = Self::default();
        let mut lines = text.lines().filter(|line| !line.trim().is_empty());

        let Some(header) = lines.next() else {
            return index;
        };
        let columns: Vec<String> = split_row(header)
            .map(|name| name.trim_start_matches('\u{feff}').to_ascii_lowercase())
            .collect();
        let position = |name: &str| columns.iter().position(|c| c == name);
        let (n_col, pts_col, fps_col, idx_col) = (
            position("n"),
            position("pts_time"),
            position("fps"),
            position("frame_idx"),
        );

        for line in lines {
            let cells: Vec<&str> = split_row(line).collect();
            let cell = |col: Option<usize>| col.and_then(|i| cells.get(i).copied());

            let row = MapRow {
                n: cell(n_col).and_then(|c| c.parse().ok()),
                pts_time: cell(pts_col).and_then(|c| c.parse().ok()),
                fps: cell(fps_col).and_then(|c| c.parse().ok()),
                frame_idx: cell(idx_col).and_then(|c| c.parse().ok()),
            };
            if let Some(n) = row.n {
                index.by_n.insert(n, row);
            }
            if let Some(frame_idx) = row.frame_idx {
                index.by_frame_idx.insert(frame_idx, row);
            }
        }

        index
    }

    pub fn is_empty(&self) -> bool {
        self.by_n.is_empty() && self.by_frame_idx.is_empty()
    }

    /// Row for keyframe number `keyframe`
    ///
    /// Tries `keyframe`, then `keyframe - 1`; for each candidate the `n`
    /// column is consulted before `frame_idx`.
    pub fn lookup(&self, keyframe: u32) -> Option<MapMatch<'_>> {
        let candidates = [Some(keyframe), keyframe.checked_sub(1)];
        for (offset, candidate) in candidates.into_iter().enumerate() {
            let Some(candidate) = candidate else { continue };
            if let Some(row) = self.by_n.get(&candidate) {
                return Some(MapMatch {
                    row,
                    kind: MatchKind::N,
                    offset: offset as u32,
                });
            }
            if let Some(row) = self.by_frame_idx.get(&candidate) {
                return Some(MapMatch {
                    row,
                    kind: MatchKind::FrameIdx,
                    offset: offset as u32,
                });
            }
        }
        None
    }
}

fn split_row(line: &str) -> impl Iterator<Item = &str> {
    line.split(',').map(|cell| cell.trim().trim_matches('"'))
}
