//! Per-frame object detection records
//!
//! Records carry parallel arrays: `detection_boxes` (`[ymin, xmin, ymax,
//! xmax]`, normalized), `detection_class_entities` and `detection_scores`.
//! Numbers may be stored as JSON numbers or as numeric strings.

use crate::error::CheckResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// JSON number or numeric string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Float(f64),
    Text(String),
}

impl Number {
    pub fn value(&self) -> Option<f64> {
        match self {
            Number::Float(v) => Some(*v),
            Number::Text(text) => text.trim().parse().ok(),
        }
    }
}

/// Raw detection record as stored on disk
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DetectionRecord {
    #[serde(default)]
    pub detection_boxes: Vec<Vec<Number>>,
    #[serde(default)]
    pub detection_class_entities: Vec<String>,
    #[serde(default)]
    pub detection_scores: Vec<Number>,
}

/// Box in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Detection kept for drawing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub label: String,
    pub score: f64,
    pub rect: PixelRect,
}

impl DetectionRecord {
    pub fn load(path: &Path) -> CheckResult<Self> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Detections scoring at least `threshold`, scaled to a `width` x `height`
    /// image
    ///
    /// Coordinates are clamped to the image; boxes one pixel wide or high (or
    /// less) are dropped, as are malformed entries.
    pub fn detections(&self, width: u32, height: u32, threshold: f64) -> Vec<Detection> {
        if width == 0 || height == 0 {
            return Vec::new();
        }

        let count = self
            .detection_boxes
            .len()
            .min(self.detection_class_entities.len())
            .min(self.detection_scores.len());

        (0..count)
            .filter_map(|i| {
                let score = self.detection_scores[i].value().unwrap_or(0.0);
                if score < threshold {
                    return None;
                }
                let coords: Vec<f64> = self.detection_boxes[i]
                    .iter()
                    .map(Number::value)
                    .collect::<Option<_>>()?;
                let [y_min, x_min, y_max, x_max] = coords.as_slice() else {
                    return None;
                };

                let x1 = scale(*x_min, width);
                let y1 = scale(*y_min, height);
                let x2 = scale(*x_max, width);
                let y2 = scale(*y_max, height);
                let rect = PixelRect {
                    x: x1,
                    y: y1,
                    width: x2.saturating_sub(x1),
                    height: y2.saturating_sub(y1),
                };
                (rect.width > 1 && rect.height > 1).then(|| Detection {
                    label: self.detection_class_entities[i].clone(),
                    score,
                    rect,
                })
            })
            .collect()
    }
}

/// Normalized coordinate to a pixel in `0..extent`
fn scale(normalized: f64, extent: u32) -> u32 {
    let max = f64::from(extent - 1);
    (normalized * f64::from(extent)).round().clamp(0.0, max) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> DetectionRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_boxes_scaled_and_filtered_by_score() {
        let rec = record(json!({
            "detection_boxes": [[0.1, 0.2, 0.5, 0.6], [0.0, 0.0, 1.0, 1.0]],
            "detection_class_entities": ["Person", "Car"],
            "detection_scores": [0.9, 0.1]
        }));

        let found = rec.detections(100, 200, 0.3);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, "Person");
        assert_eq!(
            found[0].rect,
            PixelRect {
                x: 20,
                y: 20,
                width: 40,
                height: 80
            }
        );
    }

    #[test]
    fn test_string_numbers_accepted() {
        let rec = record(json!({
            "detection_boxes": [["0.0", "0.0", "1.0", "1.0"]],
            "detection_class_entities": ["Tree"],
            "detection_scores": ["0.75"]
        }));
        let found = rec.detections(10, 10, 0.3);
        assert_eq!(found.len(), 1);
        // Clamped to the last pixel
        assert_eq!(found[0].rect.width, 9);
        assert_eq!(found[0].score, 0.75);
    }

    #[test]
    fn test_degenerate_and_malformed_boxes_dropped() {
        let rec = record(json!({
            "detection_boxes": [[0.5, 0.5, 0.505, 0.9], [0.1, 0.1, 0.2], [0.1, "x", 0.5, 0.5]],
            "detection_class_entities": ["Thin", "Short", "Bad"],
            "detection_scores": [0.9, 0.9, 0.9]
        }));
        assert!(rec.detections(100, 100, 0.3).is_empty());
    }

    #[test]
    fn test_mismatched_array_lengths_use_shortest() {
        let rec = record(json!({
            "detection_boxes": [[0.0, 0.0, 0.5, 0.5], [0.0, 0.0, 0.5, 0.5]],
            "detection_class_entities": ["A"],
            "detection_scores": [0.9, 0.9]
        }));
        assert_eq!(rec.detections(100, 100, 0.3).len(), 1);
    }

    #[test]
    fn test_missing_arrays_mean_no_detections() {
        let rec = record(json!({}));
        assert!(rec.detections(100, 100, 0.0).is_empty());
    }
}
