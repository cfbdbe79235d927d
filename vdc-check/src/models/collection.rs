//! The six parallel artifact collections

use serde::{Deserialize, Serialize};
use std::fmt;
use vdc_common::config::SizeThresholds;

/// How a collection lays out its files on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// `<dir>/<VideoId>.<ext>`, one file per video
    Flat,
    /// `<dir>/<VideoId>/<frame>.<ext>`, many indexed files per video
    PerVideoFrames,
}

/// One of the six artifact types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Video,
    Keyframe,
    Feature,
    Map,
    MediaInfo,
    Objects,
}

impl Collection {
    /// Scan / report order
    pub const ALL: [Collection; 6] = [
        Collection::Video,
        Collection::Keyframe,
        Collection::Feature,
        Collection::Map,
        Collection::MediaInfo,
        Collection::Objects,
    ];

    /// Directory name under the dataset root
    pub fn dir_name(self) -> &'static str {
        match self {
            Collection::Video => "video",
            Collection::Keyframe => "keyframes",
            Collection::Feature => "clip-features-32",
            Collection::Map => "map-keyframes",
            Collection::MediaInfo => "media-info",
            Collection::Objects => "objects",
        }
    }

    /// Expected file extension (lowercase, no dot)
    pub fn extension(self) -> &'static str {
        match self {
            Collection::Video => "mp4",
            Collection::Keyframe => "jpg",
            Collection::Feature => "npy",
            Collection::Map => "csv",
            Collection::MediaInfo | Collection::Objects => "json",
        }
    }

    pub fn layout(self) -> Layout {
        match self {
            Collection::Keyframe | Collection::Objects => Layout::PerVideoFrames,
            _ => Layout::Flat,
        }
    }

    pub fn is_frame_indexed(self) -> bool {
        self.layout() == Layout::PerVideoFrames
    }

    /// Human-readable name used in console and Markdown output
    pub fn label(self) -> &'static str {
        match self {
            Collection::Video => "Videos",
            Collection::Keyframe => "Keyframes",
            Collection::Feature => "Features",
            Collection::Map => "Maps",
            Collection::MediaInfo => "Media Info",
            Collection::Objects => "Objects",
        }
    }

    /// Minimum acceptable size for files of this collection
    pub fn min_size(self, thresholds: &SizeThresholds) -> u64 {
        match self {
            Collection::Video => thresholds.video,
            Collection::Keyframe => thresholds.keyframe,
            Collection::Feature => thresholds.feature,
            Collection::Map => thresholds.map,
            Collection::MediaInfo => thresholds.media_info,
            Collection::Objects => thresholds.objects,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}
