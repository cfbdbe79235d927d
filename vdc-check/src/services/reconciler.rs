//! Cross-directory reconciler
//!
//! Joins the six inventories on VideoId. For every id in the union it records
//! the collections lacking it and, when both frame-indexed collections hold
//! it, whether their frame-index sets line up.

use crate::models::{
    Collection, DiscrepancyRecord, FlaggedFile, FrameAlignment, FrameIndexSet, FrameMismatch,
    Inventory, MetadataIssue, Orphan, VideoId,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Result of joining all inventories
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Reconciliation {
    /// Union of every VideoId seen in any collection
    pub video_ids: BTreeSet<VideoId>,
    /// Only ids with at least one finding
    pub records: BTreeMap<VideoId, DiscrepancyRecord>,
    /// Chosen Keyframe/Objects alignment per id
    pub alignments: BTreeMap<VideoId, FrameAlignment>,
    pub orphans: Vec<Orphan>,
}

impl Reconciliation {
    /// Merge detector findings into the per-id records
    ///
    /// Flags on files that resolved to no id stay out of the records; they are
    /// reported through the global flagged-file list.
    pub fn attach_flags(&mut self, flags: &[FlaggedFile]) {
        for flag in flags {
            if let Some(video_id) = &flag.video_id {
                self.record_mut(video_id).flagged.push(flag.clone());
            }
        }
    }

    pub fn attach_metadata_issues(&mut self, issues: &[MetadataIssue]) {
        for issue in issues {
            self.record_mut(&issue.video_id).metadata = Some(issue.clone());
        }
    }

    /// Objects frame index paired with keyframe `keyframe_index` for this id
    pub fn objects_frame_for(&self, video_id: &VideoId, keyframe_index: u32) -> Option<u32> {
        self.alignments
            .get(video_id)
            .and_then(|alignment| alignment.objects_index_for(keyframe_index))
    }

    pub fn alignment(&self, video_id: &VideoId) -> FrameAlignment {
        self.alignments
            .get(video_id)
            .copied()
            .unwrap_or(FrameAlignment::NotApplicable)
    }

    /// Ids without any finding
    pub fn passing_count(&self) -> usize {
        self.video_ids.len() - self.records.len()
    }

    /// Ids lacking `collection`, in order
    pub fn missing_from(&self, collection: Collection) -> Vec<&VideoId> {
        self.records
            .values()
            .filter(|record| record.missing.contains(&collection))
            .map(|record| &record.video_id)
            .collect()
    }

    fn record_mut(&mut self, video_id: &VideoId) -> &mut DiscrepancyRecord {
        self.records
            .entry(video_id.clone())
            .or_insert_with(|| DiscrepancyRecord::new(video_id.clone()))
    }
}

/// Join the inventories
///
/// An inventory absent from `inventories` counts as an empty collection.
/// Output does not depend on the order of `inventories`.
pub fn reconcile(inventories: &[Inventory]) -> Reconciliation {
    let by_collection: BTreeMap<Collection, &Inventory> =
        inventories.iter().map(|inv| (inv.collection, inv)).collect();

    let mut result = Reconciliation {
        video_ids: inventories
            .iter()
            .flat_map(|inv| inv.video_ids().cloned())
            .collect(),
        ..Default::default()
    };

    for video_id in &result.video_ids {
        let mut record = DiscrepancyRecord::new(video_id.clone());

        for collection in Collection::ALL {
            let held = by_collection
                .get(&collection)
                .is_some_and(|inv| inv.contains(video_id));
            if !held {
                record.missing.insert(collection);
            }
        }

        let keyframes = by_collection
            .get(&Collection::Keyframe)
            .and_then(|inv| inv.frame_set(video_id));
        let objects = by_collection
            .get(&Collection::Objects)
            .and_then(|inv| inv.frame_set(video_id));

        let alignment = match (keyframes, objects) {
            (Some(keyframes), Some(objects)) => {
                let (alignment, mismatch) = align_frames(&keyframes, &objects);
                if alignment.is_shifted() {
                    warn!(
                        video_id = %video_id,
                        ?alignment,
                        "Keyframe and objects numbering differ by one; pairing with offset"
                    );
                }
                record.frame_mismatch = mismatch;
                alignment
            }
            _ => FrameAlignment::NotApplicable,
        };
        result.alignments.insert(video_id.clone(), alignment);

        if !record.is_clean() {
            debug!(video_id = %video_id, missing = record.missing.len(), "Discrepancy");
            result.records.insert(video_id.clone(), record);
        }
    }

    for inventory in inventories {
        result
            .orphans
            .extend(inventory.unparseable.iter().map(|unparsed| Orphan {
                collection: inventory.collection,
                path: unparsed.file.path.clone(),
                reason: unparsed.reason.clone(),
            }));
    }
    result
        .orphans
        .sort_by(|a, b| (a.collection, &a.path).cmp(&(b.collection, &b.path)));

    result
}

/// Compare Keyframe and Objects frame-index sets
///
/// Identical sets align directly. Otherwise a whole-set shift of one in
/// either direction is accepted as the 0-based / 1-based numbering
/// ambiguity. When nothing aligns, the raw symmetric difference is returned.
pub fn align_frames(
    keyframes: &FrameIndexSet,
    objects: &FrameIndexSet,
) -> (FrameAlignment, Option<FrameMismatch>) {
    if keyframes == objects {
        return (FrameAlignment::Direct, None);
    }
    if shifted_by_one(objects) == *keyframes {
        return (FrameAlignment::KeyframesOneAhead, None);
    }
    if shifted_by_one(keyframes) == *objects {
        return (FrameAlignment::ObjectsOneAhead, None);
    }

    let mismatch = FrameMismatch {
        keyframe_only: keyframes.difference(objects).copied().collect(),
        objects_only: objects.difference(keyframes).copied().collect(),
    };
    (FrameAlignment::Unaligned, Some(mismatch))
}

fn shifted_by_one(set: &FrameIndexSet) -> FrameIndexSet {
    set.iter().filter_map(|i| i.checked_add(1)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ScannedFile, UnparsedFile};
    use std::path::PathBuf;

    fn id(text: &str) -> VideoId {
        VideoId::parse(text).unwrap()
    }

    fn file(path: &str) -> ScannedFile {
        ScannedFile {
            path: PathBuf::from(path),
            size: 4096,
        }
    }

    fn frames(range: std::ops::RangeInclusive<u32>) -> FrameIndexSet {
        range.collect()
    }

    /// Six inventories, every listed id held everywhere with frames 1..=3
    fn complete(ids: &[&str]) -> Vec<Inventory> {
        Collection::ALL
            .iter()
            .map(|&collection| {
                let mut inv = Inventory::new(collection, PathBuf::from(collection.dir_name()));
                inv.present = true;
                for text in ids {
                    if collection.is_frame_indexed() {
                        for frame in 1..=3 {
                            inv.insert(id(text), Some(frame), file(&format!("{}/{}", text, frame)));
                        }
                    } else {
                        inv.insert(id(text), None, file(text));
                    }
                }
                inv
            })
            .collect()
    }

    #[test]
    fn test_complete_dataset_has_no_records() {
        let result = reconcile(&complete(&["L21_V001", "L21_V002"]));
        assert_eq!(result.video_ids.len(), 2);
        assert!(result.records.is_empty());
        assert_eq!(result.passing_count(), 2);
        assert_eq!(result.alignment(&id("L21_V001")), FrameAlignment::Direct);
    }

    #[test]
    fn test_missing_collections_are_recorded() {
        let mut inventories = complete(&["L21_V001", "L21_V002"]);
        for inv in inventories.iter_mut().filter(|i| i.collection.is_frame_indexed()) {
            inv.entries.remove(&id("L21_V002"));
        }

        let result = reconcile(&inventories);
        assert_eq!(result.records.len(), 1);
        let record = &result.records[&id("L21_V002")];
        assert_eq!(
            record.missing.iter().copied().collect::<Vec<_>>(),
            vec![Collection::Keyframe, Collection::Objects]
        );
        assert_eq!(result.alignment(&id("L21_V002")), FrameAlignment::NotApplicable);
        assert_eq!(result.missing_from(Collection::Keyframe), vec![&id("L21_V002")]);
    }

    #[test]
    fn test_absent_inventory_counts_as_empty_collection() {
        let inventories: Vec<Inventory> = complete(&["L21_V001"])
            .into_iter()
            .filter(|inv| inv.collection != Collection::Feature)
            .collect();
        let result = reconcile(&inventories);
        let record = &result.records[&id("L21_V001")];
        assert!(record.missing.contains(&Collection::Feature));
    }

    #[test]
    fn test_align_frames_direct_and_shifted() {
        assert_eq!(align_frames(&frames(1..=5), &frames(1..=5)).0, FrameAlignment::Direct);
        assert_eq!(
            align_frames(&frames(1..=5), &frames(0..=4)),
            (FrameAlignment::KeyframesOneAhead, None)
        );
        assert_eq!(
            align_frames(&frames(0..=4), &frames(1..=5)),
            (FrameAlignment::ObjectsOneAhead, None)
        );
    }

    #[test]
    fn test_align_frames_reports_raw_difference() {
        let keyframes: FrameIndexSet = [1, 2, 3, 7].into_iter().collect();
        let objects: FrameIndexSet = [1, 2, 4].into_iter().collect();
        let (alignment, mismatch) = align_frames(&keyframes, &objects);
        assert_eq!(alignment, FrameAlignment::Unaligned);
        let mismatch = mismatch.unwrap();
        assert_eq!(mismatch.keyframe_only.into_iter().collect::<Vec<_>>(), vec![3, 7]);
        assert_eq!(mismatch.objects_only.into_iter().collect::<Vec<_>>(), vec![4]);
    }

    #[test]
    fn test_shifted_objects_reconcile_without_record() {
        let mut inventories = complete(&["L21_V001"]);
        let objects = inventories
            .iter_mut()
            .find(|i| i.collection == Collection::Objects)
            .unwrap();
        objects.entries.clear();
        for frame in 0..=2 {
            objects.insert(id("L21_V001"), Some(frame), file(&format!("o/{}", frame)));
        }

        let result = reconcile(&inventories);
        assert!(result.records.is_empty());
        assert_eq!(result.alignment(&id("L21_V001")), FrameAlignment::KeyframesOneAhead);
        assert_eq!(result.objects_frame_for(&id("L21_V001"), 3), Some(2));
    }

    #[test]
    fn test_orphans_collected_and_sorted() {
        let mut inventories = complete(&["L21_V001"]);
        inventories[3].unparseable.push(UnparsedFile {
            file: file("map-keyframes/zz.csv"),
            reason: "Unrecognized file name: zz.csv".to_string(),
        });
        inventories[0].unparseable.push(UnparsedFile {
            file: file("video/readme.mp4"),
            reason: "Unrecognized file name: readme.mp4".to_string(),
        });

        let result = reconcile(&inventories);
        assert_eq!(result.orphans.len(), 2);
        assert_eq!(result.orphans[0].collection, Collection::Video);
        assert_eq!(result.orphans[1].collection, Collection::Map);
        // Orphans alone do not create records
        assert!(result.records.is_empty());
    }

    #[test]
    fn test_reconcile_independent_of_inventory_order() {
        let mut inventories = complete(&["L21_V001", "L22_V003"]);
        inventories[4].entries.remove(&id("L22_V003"));
        let forward = reconcile(&inventories);
        inventories.reverse();
        assert_eq!(reconcile(&inventories), forward);
    }

    #[test]
    fn test_attach_creates_records() {
        let mut result = reconcile(&complete(&["L21_V001"]));
        result.attach_metadata_issues(&[MetadataIssue {
            video_id: id("L21_V001"),
            path: PathBuf::from("media-info/L21_V001.json"),
            missing_fields: vec!["author".to_string()],
            parse_error: None,
        }]);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.passing_count(), 0);
    }
}
