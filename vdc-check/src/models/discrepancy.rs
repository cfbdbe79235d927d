//! Findings produced by the reconciler, file checker and metadata check

use super::{Collection, VideoId};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Outcome of comparing Keyframe and Objects frame-index sets for one video
///
/// The two shifted variants are a tie-break for the 0-based / 1-based
/// numbering ambiguity between the two collections, not a verified mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameAlignment {
    /// Identical index sets
    Direct,
    /// keyframe index = objects index + 1
    KeyframesOneAhead,
    /// objects index = keyframe index + 1
    ObjectsOneAhead,
    /// No alignment reconciles the sets
    Unaligned,
    /// The video is absent from Keyframe or Objects
    NotApplicable,
}

impl FrameAlignment {
    pub fn is_shifted(self) -> bool {
        matches!(self, FrameAlignment::KeyframesOneAhead | FrameAlignment::ObjectsOneAhead)
    }

    /// Objects frame index matching a keyframe index under this alignment
    pub fn objects_index_for(self, keyframe_index: u32) -> Option<u32> {
        match self {
            FrameAlignment::Direct | FrameAlignment::Unaligned => Some(keyframe_index),
            FrameAlignment::KeyframesOneAhead => keyframe_index.checked_sub(1),
            FrameAlignment::ObjectsOneAhead => keyframe_index.checked_add(1),
            FrameAlignment::NotApplicable => None,
        }
    }
}

/// Raw (unshifted) symmetric difference of the two frame-index sets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameMismatch {
    pub keyframe_only: BTreeSet<u32>,
    pub objects_only: BTreeSet<u32>,
}

impl FrameMismatch {
    pub fn len(&self) -> usize {
        self.keyframe_only.len() + self.objects_only.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Why a file was flagged
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FlagReason {
    /// 0 bytes
    Empty,
    /// Smaller than the collection's minimum size
    Undersized { min_size: u64 },
    /// Base name carries a copy suffix such as `(1)` or `_backup`
    DuplicateName { pattern: String },
    /// Several files share one (video[, frame]) slot
    Cardinality { count: usize },
}

impl FlagReason {
    pub fn tag(&self) -> &'static str {
        match self {
            FlagReason::Empty => "empty",
            FlagReason::Undersized { .. } => "undersized",
            FlagReason::DuplicateName { .. } => "duplicate_name",
            FlagReason::Cardinality { .. } => "cardinality",
        }
    }
}

/// A file the detector flagged; the file itself is never touched
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlaggedFile {
    pub collection: Collection,
    pub path: PathBuf,
    pub size: u64,
    pub video_id: Option<VideoId>,
    pub frame: Option<u32>,
    #[serde(flatten)]
    pub reason: FlagReason,
}

/// MediaInfo record with absent, null or empty required fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataIssue {
    pub video_id: VideoId,
    pub path: PathBuf,
    pub missing_fields: Vec<String>,
    pub parse_error: Option<String>,
}

/// File that resolved to no VideoId
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Orphan {
    pub collection: Collection,
    pub path: PathBuf,
    pub reason: String,
}

/// Everything wrong with one video
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscrepancyRecord {
    pub video_id: VideoId,
    pub missing: BTreeSet<Collection>,
    pub frame_mismatch: Option<FrameMismatch>,
    pub flagged: Vec<FlaggedFile>,
    pub metadata: Option<MetadataIssue>,
}

impl DiscrepancyRecord {
    pub fn new(video_id: VideoId) -> Self {
        Self {
            video_id,
            missing: BTreeSet::new(),
            frame_mismatch: None,
            flagged: Vec::new(),
            metadata: None,
        }
    }

    /// True when nothing was recorded, i.e. the video passes
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty()
            && self.frame_mismatch.is_none()
            && self.flagged.is_empty()
            && self.metadata.is_none()
    }
}
