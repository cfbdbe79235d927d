//! Quality sampler
//!
//! Optional visual spot check run after validation. For each video held by
//! both Keyframe and Objects it looks up a few keyframes in the timing map
//! and the detection records, then renders a bounded random selection of
//! annotated keyframes. It reads inventories and the reconciliation only and
//! never affects the validation verdict.

pub mod map_csv;
pub mod objects;
pub mod overlay;

use crate::error::CheckResult;
use crate::models::{Collection, FrameAlignment, Inventory, ScannedFile, VideoId};
use crate::services::Reconciliation;
use chrono::{DateTime, Utc};
use map_csv::{MapIndex, MatchKind};
use objects::{Detection, DetectionRecord};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use vdc_common::config::SamplerConfig;

/// Summary file name inside the quality directory
pub const QUALITY_SUMMARY_FILE: &str = "quality_summary.json";

/// Sampler settings for one run
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerOptions {
    pub frames_per_video: usize,
    pub max_images: usize,
    pub score_threshold: f64,
    pub seed: Option<u64>,
    /// Receives `quality_summary.json` and `overlays/`
    pub output_dir: PathBuf,
}

impl SamplerOptions {
    pub fn from_config(config: &SamplerConfig, reports_dir: &Path) -> Self {
        Self {
            frames_per_video: config.frames_per_video,
            max_images: config.max_images,
            score_threshold: f64::from(config.score_threshold),
            seed: config.seed,
            output_dir: reports_dir.join("quality"),
        }
    }
}

/// Match tallies over sampled frames
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchCounts {
    pub by_n: usize,
    pub by_frame_idx: usize,
    pub unmatched: usize,
}

impl MatchCounts {
    fn add(&mut self, other: MatchCounts) {
        self.by_n += other.by_n;
        self.by_frame_idx += other.by_frame_idx;
        self.unmatched += other.unmatched;
    }
}

/// Result for one sampled keyframe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSample {
    pub keyframe: PathBuf,
    pub keyframe_index: u32,
    pub objects_file: Option<PathBuf>,
    pub detections: usize,
    pub map_row_found: bool,
    pub matched_by: Option<MatchKind>,
    /// 1 when the map row was found for `keyframe_index - 1`
    pub map_offset: Option<u32>,
    pub fps: Option<f64>,
    pub pts_time: Option<f64>,
    /// `frame_idx` from the map, else the keyframe index
    pub display_frame: u32,
    pub display_time: Option<f64>,
    pub error: Option<String>,
}

/// Results for one video
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoSample {
    pub video_id: VideoId,
    pub alignment: FrameAlignment,
    pub frames: Vec<FrameSample>,
    pub matches: MatchCounts,
}

/// One rendered overlay
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayEntry {
    pub output_file: PathBuf,
    pub video_id: VideoId,
    pub keyframe: PathBuf,
    pub frame: u32,
    pub time_sec: Option<f64>,
    pub num_boxes: usize,
}

/// Contents of `quality_summary.json`
#[derive(Debug, Clone, Serialize)]
pub struct QualitySummary {
    pub generated_at: DateTime<Utc>,
    pub seed: Option<u64>,
    pub score_threshold: f64,
    pub videos: Vec<VideoSample>,
    pub totals: MatchCounts,
    pub overlays: Vec<OverlayEntry>,
}

/// Frame worth drawing: it has boxes or timing information
struct Candidate {
    video_id: VideoId,
    keyframe: PathBuf,
    detections: Vec<Detection>,
    frame: u32,
    time_sec: Option<f64>,
}

/// Run the sampler and write its outputs under `options.output_dir`
///
/// Blocking; call from a blocking context.
pub fn run(
    inventories: &[Inventory],
    reconciliation: &Reconciliation,
    options: &SamplerOptions,
) -> CheckResult<QualitySummary> {
    let find = |collection: Collection| inventories.iter().find(|i| i.collection == collection);
    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut videos = Vec::new();
    let mut candidates = Vec::new();
    let mut totals = MatchCounts::default();

    if let (Some(keyframes), Some(objects)) = (find(Collection::Keyframe), find(Collection::Objects)) {
        let maps = find(Collection::Map);
        for video_id in keyframes.video_ids().filter(|id| objects.contains(id)) {
            let sample = sample_video(
                video_id,
                keyframes,
                objects,
                maps,
                reconciliation,
                options,
                &mut rng,
                &mut candidates,
            );
            totals.add(sample.matches);
            videos.push(sample);
        }
    }

    if videos.is_empty() {
        info!("No video is present in both keyframes and objects; nothing to sample");
    }

    std::fs::create_dir_all(&options.output_dir)?;
    let overlays = render_overlays(candidates, options, &mut rng)?;

    let summary = QualitySummary {
        generated_at: vdc_common::time::now(),
        seed: options.seed,
        score_threshold: options.score_threshold,
        videos,
        totals,
        overlays,
    };

    let summary_path = options.output_dir.join(QUALITY_SUMMARY_FILE);
    std::fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)?;
    info!(
        videos = summary.videos.len(),
        overlays = summary.overlays.len(),
        "Quality summary saved to: {}",
        summary_path.display()
    );

    Ok(summary)
}

#[allow(clippy::too_many_arguments)]
fn sample_video(
    video_id: &VideoId,
    keyframes: &Inventory,
    objects: &Inventory,
    maps: Option<&Inventory>,
    reconciliation: &Reconciliation,
    options: &SamplerOptions,
    rng: &mut StdRng,
    candidates: &mut Vec<Candidate>,
) -> VideoSample {
    let keyframe_files = first_file_per_frame(keyframes, video_id);
    let object_files = first_file_per_frame(objects, video_id);

    let map_index = maps
        .and_then(|inv| inv.holdings(video_id))
        .and_then(|holdings| holdings.files().first().map(|f| f.path.clone()))
        .map(|path| {
            MapIndex::load(&path).unwrap_or_else(|e| {
                warn!(path = %path.display(), "Failed to read keyframe map: {}", e);
                MapIndex::default()
            })
        })
        .unwrap_or_default();

    let objects_for = |index: u32| {
        reconciliation
            .objects_frame_for(video_id, index)
            .and_then(|o| object_files.get(&o))
    };

    // Frames with a detection record first, then the rest
    let (with_objects, without_objects): (Vec<u32>, Vec<u32>) = keyframe_files
        .keys()
        .copied()
        .partition(|index| objects_for(*index).is_some());
    let mut chosen: Vec<u32> = with_objects
        .choose_multiple(rng, options.frames_per_video)
        .copied()
        .collect();
    let remaining = options.frames_per_video.saturating_sub(chosen.len());
    chosen.extend(without_objects.choose_multiple(rng, remaining).copied());
    chosen.sort_unstable();

    let mut matches = MatchCounts::default();
    let mut frames = Vec::with_capacity(chosen.len());

    for index in chosen {
        let Some(keyframe) = keyframe_files.get(&index) else {
            continue;
        };
        let objects_file = objects_for(index).map(|f| f.path.clone());

        let mut error = None;
        let detections = match &objects_file {
            Some(path) => load_detections(path, &keyframe.path, options.score_threshold)
                .unwrap_or_else(|e| {
                    debug!(path = %path.display(), "Detections unavailable: {}", e);
                    error = Some(e.to_string());
                    Vec::new()
                }),
            None => Vec::new(),
        };

        let found = map_index.lookup(index);
        match found.map(|m| m.kind) {
            Some(MatchKind::N) => matches.by_n += 1,
            Some(MatchKind::FrameIdx) => matches.by_frame_idx += 1,
            None => matches.unmatched += 1,
        }
        let row = found.map(|m| *m.row);
        let display_frame = row.and_then(|r| r.frame_idx).unwrap_or(index);
        let display_time = row.and_then(|r| r.display_time());

        let has_timing = row.is_some_and(|r| r.fps.is_some() || r.pts_time.is_some());
        if !detections.is_empty() || has_timing {
            candidates.push(Candidate {
                video_id: video_id.clone(),
                keyframe: keyframe.path.clone(),
                detections: detections.clone(),
                frame: display_frame,
                time_sec: display_time,
            });
        }

        frames.push(FrameSample {
            keyframe: keyframe.path.clone(),
            keyframe_index: index,
            objects_file,
            detections: detections.len(),
            map_row_found: found.is_some(),
            matched_by: found.map(|m| m.kind),
            map_offset: found.map(|m| m.offset),
            fps: row.and_then(|r| r.fps),
            pts_time: row.and_then(|r| r.pts_time),
            display_frame,
            display_time,
            error,
        });
    }

    VideoSample {
        video_id: video_id.clone(),
        alignment: reconciliation.alignment(video_id),
        frames,
        matches,
    }
}

fn first_file_per_frame<'a>(
    inventory: &'a Inventory,
    video_id: &VideoId,
) -> BTreeMap<u32, &'a ScannedFile> {
    match inventory.holdings(video_id) {
        Some(crate::models::Holdings::Frames(frames)) => frames
            .iter()
            .filter_map(|(index, files)| files.first().map(|f| (*index, f)))
            .collect(),
        _ => BTreeMap::new(),
    }
}

fn load_detections(
    objects_file: &Path,
    keyframe: &Path,
    threshold: f64,
) -> CheckResult<Vec<Detection>> {
    let record = DetectionRecord::load(objects_file)?;
    let (width, height) = image::image_dimensions(keyframe)?;
    Ok(record.detections(width, height, threshold))
}

/// Render up to `max_images` random candidates as `overlays/random<N>.jpg`
fn render_overlays(
    candidates: Vec<Candidate>,
    options: &SamplerOptions,
    rng: &mut StdRng,
) -> CheckResult<Vec<OverlayEntry>> {
    let overlay_dir = options.output_dir.join("overlays");
    // Drop overlays left by an earlier run
    if overlay_dir.exists() {
        std::fs::remove_dir_all(&overlay_dir)?;
    }
    if candidates.is_empty() || options.max_images == 0 {
        return Ok(Vec::new());
    }
    std::fs::create_dir_all(&overlay_dir)?;

    let mut manifest = Vec::new();
    for candidate in candidates.choose_multiple(rng, options.max_images) {
        let output_file = overlay_dir.join(format!("random{}.jpg", manifest.len() + 1));
        match overlay::render_to_file(&candidate.keyframe, &candidate.detections, &output_file) {
            Ok(()) => manifest.push(OverlayEntry {
                output_file,
                video_id: candidate.video_id.clone(),
                keyframe: candidate.keyframe.clone(),
                frame: candidate.frame,
                time_sec: candidate.time_sec,
                num_boxes: candidate.detections.len(),
            }),
            Err(e) => warn!(
                keyframe = %candidate.keyframe.display(),
                "Failed to render overlay: {}", e
            ),
        }
    }

    Ok(manifest)
}
