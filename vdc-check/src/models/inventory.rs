//! Per-collection inventory produced by one scan

use super::{Collection, VideoId};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Frame indices present for one video in Keyframe or Objects
pub type FrameIndexSet = BTreeSet<u32>;

/// One regular file seen during a scan
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub size: u64,
}

/// Files held by one video in one collection
///
/// A vector longer than one is a collision: several files resolved to the
/// same slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Holdings {
    Single(Vec<ScannedFile>),
    Frames(BTreeMap<u32, Vec<ScannedFile>>),
}

impl Holdings {
    pub fn file_count(&self) -> usize {
        match self {
            Holdings::Single(files) => files.len(),
            Holdings::Frames(frames) => frames.values().map(Vec::len).sum(),
        }
    }

    /// `None` for single-file holdings
    pub fn frame_indices(&self) -> Option<FrameIndexSet> {
        match self {
            Holdings::Single(_) => None,
            Holdings::Frames(frames) => Some(frames.keys().copied().collect()),
        }
    }

    /// Slots holding more than one file, keyed by frame (if any)
    pub fn collisions(&self) -> Vec<(Option<u32>, &[ScannedFile])> {
        match self {
            Holdings::Single(files) if files.len() > 1 => vec![(None, files.as_slice())],
            Holdings::Single(_) => Vec::new(),
            Holdings::Frames(frames) => frames
                .iter()
                .filter(|(_, files)| files.len() > 1)
                .map(|(frame, files)| (Some(*frame), files.as_slice()))
                .collect(),
        }
    }

    /// All files, frame order first
    pub fn files(&self) -> Vec<&ScannedFile> {
        match self {
            Holdings::Single(files) => files.iter().collect(),
            Holdings::Frames(frames) => frames.values().flatten().collect(),
        }
    }
}

/// A file whose name did not resolve to a VideoId
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnparsedFile {
    pub file: ScannedFile,
    pub reason: String,
}

/// Recoverable problem met while walking a collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanWarning {
    pub collection: Collection,
    pub path: Option<PathBuf>,
    pub message: String,
}

/// Everything one scan learned about one collection
///
/// Built fresh on every run and moved by value into the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    pub collection: Collection,
    /// `<dataset root>/<collection dir>`
    pub root: PathBuf,
    /// Whether the collection directory exists
    pub present: bool,
    /// Raw listing of every scanned file, sorted by path
    pub files: Vec<ScannedFile>,
    pub entries: BTreeMap<VideoId, Holdings>,
    pub unparseable: Vec<UnparsedFile>,
    pub warnings: Vec<ScanWarning>,
}

impl Inventory {
    pub fn new(collection: Collection, root: PathBuf) -> Self {
        Self {
            collection,
            root,
            present: false,
            files: Vec::new(),
            entries: BTreeMap::new(),
            unparseable: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Record a file under its video (and frame, for indexed collections)
    pub fn insert(&mut self, video_id: VideoId, frame: Option<u32>, file: ScannedFile) {
        let indexed = self.collection.is_frame_indexed();
        let holdings = self.entries.entry(video_id).or_insert_with(|| {
            if indexed {
                Holdings::Frames(BTreeMap::new())
            } else {
                Holdings::Single(Vec::new())
            }
        });

        match holdings {
            Holdings::Single(files) => files.push(file),
            Holdings::Frames(frames) => frames.entry(frame.unwrap_or(0)).or_default().push(file),
        }
    }

    pub fn contains(&self, video_id: &VideoId) -> bool {
        self.entries.contains_key(video_id)
    }

    pub fn holdings(&self, video_id: &VideoId) -> Option<&Holdings> {
        self.entries.get(video_id)
    }

    pub fn frame_set(&self, video_id: &VideoId) -> Option<FrameIndexSet> {
        self.entries.get(video_id).and_then(Holdings::frame_indices)
    }

    pub fn video_ids(&self) -> impl Iterator<Item = &VideoId> {
        self.entries.keys()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, size: u64) -> ScannedFile {
        ScannedFile {
            path: PathBuf::from(path),
            size,
        }
    }

    fn id(text: &str) -> VideoId {
        VideoId::parse(text).unwrap()
    }

    #[test]
    fn test_single_collection_collects_collisions() {
        let mut inv = Inventory::new(Collection::Video, PathBuf::from("/d/video"));
        inv.insert(id("L21_V001"), None, file("/d/video/L21_V001.mp4", 10));
        inv.insert(id("L21_V001"), None, file("/d/video/L21_V001(1).mp4", 10));
        inv.insert(id("L21_V002"), None, file("/d/video/L21_V002.mp4", 10));

        let holdings = inv.holdings(&id("L21_V001")).unwrap();
        assert_eq!(holdings.file_count(), 2);
        let collisions = holdings.collisions();
        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions[0].0, None);
        assert!(inv.holdings(&id("L21_V002")).unwrap().collisions().is_empty());
        assert!(inv.frame_set(&id("L21_V001")).is_none());
    }

    #[test]
    fn test_frame_collection_indexes_by_frame() {
        let mut inv = Inventory::new(Collection::Keyframe, PathBuf::from("/d/keyframes"));
        inv.insert(id("L21_V001"), Some(2), file("/d/keyframes/L21_V001/002.jpg", 10));
        inv.insert(id("L21_V001"), Some(1), file("/d/keyframes/L21_V001/001.jpg", 10));
        inv.insert(id("L21_V001"), Some(1), file("/d/keyframes/L21_V001/1.jpg", 10));

        let frames = inv.frame_set(&id("L21_V001")).unwrap();
        assert_eq!(frames.into_iter().collect::<Vec<_>>(), vec![1, 2]);

        let holdings = inv.holdings(&id("L21_V001")).unwrap();
        assert_eq!(holdings.file_count(), 3);
        let collisions = holdings.collisions();
        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions[0].0, Some(1));
        assert_eq!(collisions[0].1.len(), 2);
    }
}
