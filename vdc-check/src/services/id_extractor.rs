//! Identifier extraction from artifact paths
//!
//! Each collection names its files differently:
//! - flat collections: `<dir>/L21_V001.mp4`
//! - per-video frame collections: `<dir>/L21_V001/001.jpg` or
//!   `<dir>/L21_V001/L21_V001_001.jpg`
//!
//! `extract` is the single entry point; it dispatches on the collection's
//! [`Layout`]. It is pure: the same path always yields the same result, and a
//! rejected name is an error value, never a panic.
//!
//! Copy suffixes (`(1)`, `_copy`, `_backup(2)`, `_v3`, ...) are tolerated after
//! the identifying part so that `L21_V001(1).mp4` still resolves to
//! `L21_V001`. The file checker turns the marker into a duplicate-name flag.

use crate::models::{Collection, Layout, VideoId};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Recognized copy suffixes, most specific first: `(label, regex)`
pub const COPY_PATTERNS: &[(&str, &str)] = &[
    ("_copy(N)", r"_copy\(\d+\)"),
    ("_backup(N)", r"_backup\(\d+\)"),
    ("(N)", r"\(\d+\)"),
    ("_copy", r"_copy"),
    ("_duplicate", r"_duplicate"),
    ("_backup", r"_backup"),
    ("_old", r"_old"),
    ("_new", r"_new"),
    ("_v<N>", r"_v\d+"),
];

static COPY_SUFFIX_CHAIN: Lazy<Regex> = Lazy::new(|| {
    let alternatives: Vec<&str> = COPY_PATTERNS.iter().map(|(_, re)| *re).collect();
    Regex::new(&format!(r"(?i)^(?:{})+$", alternatives.join("|")))
        .expect("Invalid copy suffix chain regex")
});

static COPY_SUFFIX_TAILS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    COPY_PATTERNS
        .iter()
        .map(|(label, re)| {
            let tail = Regex::new(&format!(r"(?i){}$", re)).expect("Invalid copy suffix regex");
            (*label, tail)
        })
        .collect()
});

static FLAT_STEM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<id>L\d+_V\d+)(?P<rest>.*)$").expect("Invalid flat stem regex")
});

static FRAME_STEM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?P<id>L\d+_V\d+)_)?(?P<frame>\d+)(?P<rest>.*)$")
        .expect("Invalid frame stem regex")
});

/// Why a path could not be mapped to a VideoId
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("path has no file name")]
    NoFileName,

    #[error("unexpected extension {found:?} (expected .{expected})")]
    UnexpectedExtension {
        expected: &'static str,
        found: String,
    },

    #[error("unrecognized file name: {0}")]
    UnrecognizedName(String),

    #[error("frame file {0} is not inside a video directory")]
    MissingVideoDirectory(String),

    #[error("file names video {file_id} but lives in directory {dir_id}")]
    DirectoryMismatch { file_id: String, dir_id: String },
}

/// Identity of one artifact file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub video_id: VideoId,
    /// Frame index, for frame-indexed collections only
    pub frame: Option<u32>,
    /// Copy suffix found after the identifying part, e.g. `(1)`
    pub copy_marker: Option<String>,
}

/// Map a path of `collection` to its VideoId and frame index
pub fn extract(collection: Collection, path: &Path) -> Result<ParsedName, NameError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or(NameError::NoFileName)?;

    let found_ext = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();
    if !found_ext.eq_ignore_ascii_case(collection.extension()) {
        return Err(NameError::UnexpectedExtension {
            expected: collection.extension(),
            found: found_ext,
        });
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    match collection.layout() {
        Layout::Flat => extract_flat(&stem, &file_name),
        Layout::PerVideoFrames => extract_frame(&stem, &file_name, path.parent()),
    }
}

fn extract_flat(stem: &str, file_name: &str) -> Result<ParsedName, NameError> {
    let caps = FLAT_STEM_RE
        .captures(stem)
        .ok_or_else(|| NameError::UnrecognizedName(file_name.to_string()))?;

    let video_id = VideoId::parse(&caps["id"])
        .ok_or_else(|| NameError::UnrecognizedName(file_name.to_string()))?;
    let copy_marker = copy_marker(&caps["rest"], file_name)?;

    Ok(ParsedName {
        video_id,
        frame: None,
        copy_marker,
    })
}

fn extract_frame(
    stem: &str,
    file_name: &str,
    parent: Option<&Path>,
) -> Result<ParsedName, NameError> {
    let caps = FRAME_STEM_RE
        .captures(stem)
        .ok_or_else(|| NameError::UnrecognizedName(file_name.to_string()))?;

    let frame: u32 = caps["frame"]
        .parse()
        .map_err(|_| NameError::UnrecognizedName(file_name.to_string()))?;
    let copy_marker = copy_marker(&caps["rest"], file_name)?;

    let dir_id = parent
        .and_then(Path::file_name)
        .and_then(|n| VideoId::parse(&n.to_string_lossy()));

    let video_id = match (caps.name("id"), dir_id) {
        (Some(named), dir_id) => {
            let file_id = VideoId::parse(named.as_str())
                .ok_or_else(|| NameError::UnrecognizedName(file_name.to_string()))?;
            if let Some(dir_id) = dir_id {
                if dir_id != file_id {
                    return Err(NameError::DirectoryMismatch {
                        file_id: file_id.to_string(),
                        dir_id: dir_id.to_string(),
                    });
                }
            }
            file_id
        }
        (None, Some(dir_id)) => dir_id,
        (None, None) => return Err(NameError::MissingVideoDirectory(file_name.to_string())),
    };

    Ok(ParsedName {
        video_id,
        frame: Some(frame),
        copy_marker,
    })
}

/// Empty → no marker; a chain of copy suffixes → marker; anything else → reject
fn copy_marker(rest: &str, file_name: &str) -> Result<Option<String>, NameError> {
    if rest.is_empty() {
        Ok(None)
    } else if COPY_SUFFIX_CHAIN.is_match(rest) {
        Ok(Some(rest.to_string()))
    } else {
        Err(NameError::UnrecognizedName(file_name.to_string()))
    }
}

/// Label of the copy pattern `text` ends with, if any
pub fn copy_pattern(text: &str) -> Option<&'static str> {
    COPY_SUFFIX_TAILS
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(label, _)| *label)
}

/// Part of `stem` after a leading VideoId, or the whole stem
pub fn after_id_prefix(stem: &str) -> &str {
    FLAT_STEM_RE
        .captures(stem)
        .and_then(|caps| caps.name("rest"))
        .map_or(stem, |rest| rest.as_str())
}

/// Canonical path of an artifact relative to its collection directory
pub fn canonical_relative_path(
    collection: Collection,
    video_id: &VideoId,
    frame: Option<u32>,
) -> PathBuf {
    match collection.layout() {
        Layout::Flat => PathBuf::from(format!("{}.{}", video_id, collection.extension())),
        Layout::PerVideoFrames => PathBuf::from(video_id.as_str()).join(format!(
            "{}_{:03}.{}",
            video_id,
            frame.unwrap_or(0),
            collection.extension()
        )),
    }
}
