//! Canonical video identifier (`L21_V001`)

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

static VIDEO_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^L(\d+)_V(\d+)$").expect("Invalid VideoId regex"));

/// Join key shared by all six collections
///
/// Ordered numerically by level, then video number, then the raw text
/// (`L21_V999` < `L21_V1000`, `L21_V001` < `L21_V01`). This is the report order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId {
    raw: String,
    level: u32,
    sequence: u32,
}

impl VideoId {
    /// Parse a canonical id; `None` for anything else (including ids whose
    /// numbers do not fit in `u32`)
    pub fn parse(text: &str) -> Option<Self> {
        let caps = VIDEO_ID_RE.captures(text)?;
        let level = caps[1].parse().ok()?;
        let sequence = caps[2].parse().ok()?;
        Some(Self {
            raw: text.to_string(),
            level,
            sequence,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Level as written in the id, e.g. `L21`
    pub fn level_label(&self) -> &str {
        match self.raw.find('_') {
            Some(idx) => &self.raw[..idx],
            None => &self.raw,
        }
    }

    /// Video number within the level (`L21_V007` → 7)
    pub fn sequence(&self) -> u32 {
        self.sequence
    }
}

impl Ord for VideoId {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.level, self.sequence, &self.raw).cmp(&(other.level, other.sequence, &other.raw))
    }
}

impl PartialOrd for VideoId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for VideoId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for VideoId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        VideoId::parse(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid video id: {}", text)))
    }
}
