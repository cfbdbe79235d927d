//! Synthetic datasets in a temporary directory
//!
//! Files are written with sizes above the default per-collection minimums so
//! that a freshly built dataset passes unless a test breaks it on purpose.

#![allow(dead_code)]

use image::RgbImage;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use vdc_check::models::Collection;

/// Builder for a six-collection dataset rooted in a `TempDir`
pub struct DatasetBuilder {
    dir: TempDir,
}

impl DatasetBuilder {
    /// Empty dataset with all six collection directories created
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        for collection in Collection::ALL {
            fs::create_dir_all(dir.path().join(collection.dir_name())).unwrap();
        }
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Video present in every collection with keyframes/objects `1..=frames`
    pub fn complete_video(&self, id: &str, frames: u32) -> &Self {
        let indices: Vec<u32> = (1..=frames).collect();
        self.video_in(id, &Collection::ALL, &indices)
    }

    /// Video present only in `collections`
    pub fn video_in(&self, id: &str, collections: &[Collection], frames: &[u32]) -> &Self {
        for collection in collections {
            match collection {
                Collection::Video => {
                    self.write(&format!("video/{}.mp4", id), &vec![7u8; 4096]);
                }
                Collection::Feature => {
                    self.write(&format!("clip-features-32/{}.npy", id), &vec![1u8; 512]);
                }
                Collection::Map => {
                    self.write(&format!("map-keyframes/{}.csv", id), map_csv(frames).as_bytes());
                }
                Collection::MediaInfo => {
                    self.write(
                        &format!("media-info/{}.json", id),
                        media_info_json(id).as_bytes(),
                    );
                }
                Collection::Keyframe => self.keyframes(id, frames),
                Collection::Objects => self.objects(id, frames),
            }
        }
        self
    }

    /// Keyframe files `<id>/NNN.jpg` (opaque bytes, not decodable)
    pub fn keyframes(&self, id: &str, frames: &[u32]) {
        for frame in frames {
            self.write(&format!("keyframes/{}/{:03}.jpg", id, frame), &vec![9u8; 1024]);
        }
    }

    /// Decodable JPEG keyframes, for sampler tests
    pub fn image_keyframes(&self, id: &str, frames: &[u32], width: u32, height: u32) {
        for frame in frames {
            let path = self.root().join(format!("keyframes/{}/{:03}.jpg", id, frame));
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            RgbImage::from_pixel(width, height, image::Rgb([90, 120, 150]))
                .save(&path)
                .unwrap();
        }
    }

    /// Detection records `<id>/NNN.json`
    pub fn objects(&self, id: &str, frames: &[u32]) {
        for frame in frames {
            self.write(&format!("objects/{}/{:03}.json", id, frame), objects_json().as_bytes());
        }
    }

    /// Write `bytes` at `relative` under the root, creating parents
    pub fn write(&self, relative: &str, bytes: &[u8]) -> PathBuf {
        let path = self.root().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, bytes).unwrap();
        path
    }

    pub fn remove(&self, relative: &str) {
        let path = self.root().join(relative);
        if path.is_dir() {
            fs::remove_dir_all(path).unwrap();
        } else {
            fs::remove_file(path).unwrap();
        }
    }
}

/// MediaInfo record with every required field set
pub fn media_info_json(id: &str) -> String {
    serde_json::json!({
        "title": format!("Broadcast {}", id),
        "publish_date": "01/08/2024",
        "watch_url": format!("https://example.invalid/watch?v={}", id),
        "length": 1200,
        "description": "Evening news",
        "author": "Channel",
        "thumbnail_url": "https://example.invalid/thumb.jpg",
        "channel_id": "UC0000"
    })
    .to_string()
}

/// Detection record with one confident and one weak box
pub fn objects_json() -> String {
    serde_json::json!({
        "detection_boxes": [[0.1, 0.1, 0.6, 0.5], [0.2, 0.2, 0.3, 0.3]],
        "detection_class_entities": ["Person", "Hat"],
        "detection_scores": ["0.91", "0.05"]
    })
    .to_string()
}

fn map_csv(frames: &[u32]) -> String {
    let mut csv = String::from("n,pts_time,fps,frame_idx\n");
    for frame in frames {
        csv.push_str(&format!(
            "{},{:.1},25.0,{}\n",
            frame,
            f64::from(*frame) * 2.0,
            frame * 50
        ));
    }
    csv
}
