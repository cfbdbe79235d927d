//! MediaInfo required-field check
//!
//! A field counts as missing when it is absent, `null` or an empty string.
//! A record that is not a JSON object is missing every field.

use crate::models::{Inventory, MetadataIssue, VideoId};
use rayon::prelude::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Fields every MediaInfo record must carry
pub const REQUIRED_MEDIA_FIELDS: &[&str] = &[
    "title",
    "publish_date",
    "watch_url",
    "length",
    "description",
    "author",
    "thumbnail_url",
];

/// Check every MediaInfo record of `inventory`
///
/// Only the first file of a collided slot is read; the collision itself is
/// the file checker's finding. Issues come back sorted by VideoId.
pub fn check_media_info(inventory: &Inventory) -> Vec<MetadataIssue> {
    let targets: Vec<(&VideoId, &Path)> = inventory
        .entries
        .iter()
        .filter_map(|(video_id, holdings)| {
            holdings
                .files()
                .first()
                .map(|file| (video_id, file.path.as_path()))
        })
        .collect();

    let issues: Vec<MetadataIssue> = targets
        .par_iter()
        .filter_map(|(video_id, path)| check_record(video_id, path))
        .collect();

    debug!(
        checked = targets.len(),
        issues = issues.len(),
        "MediaInfo field check complete"
    );
    issues
}

fn check_record(video_id: &VideoId, path: &Path) -> Option<MetadataIssue> {
    let parsed = std::fs::read(path)
        .map_err(|e| e.to_string())
        .and_then(|bytes| serde_json::from_slice::<Value>(&bytes).map_err(|e| e.to_string()));

    let (missing_fields, parse_error) = match parsed {
        Ok(value) => (missing_fields(&value), None),
        Err(e) => {
            warn!(path = %path.display(), "Failed to read MediaInfo record: {}", e);
            (all_fields(), Some(e))
        }
    };

    if missing_fields.is_empty() {
        return None;
    }
    Some(MetadataIssue {
        video_id: video_id.clone(),
        path: PathBuf::from(path),
        missing_fields,
        parse_error,
    })
}

/// Required fields absent, null or empty in `value`
pub fn missing_fields(value: &Value) -> Vec<String> {
    let Some(object) = value.as_object() else {
        return all_fields();
    };

    REQUIRED_MEDIA_FIELDS
        .iter()
        .filter(|field| match object.get(**field) {
            None | Some(Value::Null) => true,
            Some(Value::String(text)) => text.is_empty(),
            Some(_) => false,
        })
        .map(|field| field.to_string())
        .collect()
}

fn all_fields() -> Vec<String> {
    REQUIRED_MEDIA_FIELDS.iter().map(|f| f.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Collection, ScannedFile};
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn complete_record() -> Value {
        json!({
            "title": "Evening news",
            "publish_date": "01/08/2024",
            "watch_url": "https://example.invalid/watch?v=1",
            "length": 1234,
            "description": "...",
            "author": "Channel",
            "thumbnail_url": "https://example.invalid/1.jpg"
        })
    }

    #[test]
    fn test_complete_record_has_no_missing_fields() {
        assert!(missing_fields(&complete_record()).is_empty());
    }

    #[test]
    fn test_null_empty_and_absent_fields() {
        let mut record = complete_record();
        record["author"] = Value::Null;
        record["title"] = json!("");
        record.as_object_mut().unwrap().remove("thumbnail_url");
        // Zero is a value, not an absence
        record["length"] = json!(0);

        assert_eq!(missing_fields(&record), vec!["title", "author", "thumbnail_url"]);
    }

    #[test]
    fn test_non_object_misses_everything() {
        assert_eq!(missing_fields(&json!([1, 2])).len(), REQUIRED_MEDIA_FIELDS.len());
    }

    #[test]
    fn test_check_media_info_reads_files() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("L21_V001.json");
        let bad = temp_dir.path().join("L21_V002.json");
        fs::write(&good, complete_record().to_string()).unwrap();
        fs::write(&bad, b"{ not json").unwrap();

        let mut inv = Inventory::new(Collection::MediaInfo, temp_dir.path().to_path_buf());
        for (name, path) in [("L21_V001", &good), ("L21_V002", &bad)] {
            inv.insert(
                VideoId::parse(name).unwrap(),
                None,
                ScannedFile {
                    path: path.clone(),
                    size: 10,
                },
            );
        }

        let issues = check_media_info(&inv);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].video_id.as_str(), "L21_V002");
        assert!(issues[0].parse_error.is_some());
        assert_eq!(issues[0].missing_fields.len(), REQUIRED_MEDIA_FIELDS.len());
    }
}
