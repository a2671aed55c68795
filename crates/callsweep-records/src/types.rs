use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One communication session between two endpoints.
///
/// `subject_uri` and `subject_display_name` carry which mailbox the row
/// was retrieved for. The subject is usually one of the two endpoints,
/// but not always (e.g. a conference the subject organized).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub start_time: Option<DateTime<Utc>>,
    /// Missing when the session never closed cleanly.
    pub end_time: Option<DateTime<Utc>>,
    pub from_uri: String,
    pub to_uri: String,
    pub from_number: Option<String>,
    pub to_number: Option<String>,
    pub referred_by: Option<String>,
    pub from_client_version: String,
    pub to_client_version: String,
    /// Comma-separated media descriptors, e.g. "audio, video".
    pub media_types: String,
    pub subject_uri: String,
    pub subject_display_name: String,
    /// Extra service fields, kept only in full-detail runs.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub detail: BTreeMap<String, serde_json::Value>,
}

impl SessionRecord {
    pub fn is_incomplete(&self) -> bool {
        self.end_time.is_none()
    }
}

/// A directory principal whose history can be scanned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub uri: String,
    pub display_name: String,
    pub enabled: bool,
}

/// Half-open UTC interval: start inclusive, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window covering `days` full days counting back from `end`.
    pub fn ending_at(end: DateTime<Utc>, days: i64) -> Self {
        Self {
            start: end - chrono::Duration::days(days),
            end,
        }
    }

    /// Same end bound with the start moved to `start`.
    pub fn starting_at(&self, start: DateTime<Utc>) -> Self {
        Self {
            start,
            end: self.end,
        }
    }
}

/// Session categories the service distinguishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaCategory {
    /// No category restriction.
    #[default]
    All,
    Audio,
    Conference,
    Im,
    Video,
}

impl MediaCategory {
    /// Token looked for in a record's media descriptors, `None` for `All`.
    pub fn token(&self) -> Option<&'static str> {
        match self {
            MediaCategory::All => None,
            MediaCategory::Audio => Some("audio"),
            MediaCategory::Conference => Some("conference"),
            MediaCategory::Im => Some("im"),
            MediaCategory::Video => Some("video"),
        }
    }
}

impl std::fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaCategory::All => write!(f, "All"),
            MediaCategory::Audio => write!(f, "Audio"),
            MediaCategory::Conference => write!(f, "Conference"),
            MediaCategory::Im => write!(f, "IM"),
            MediaCategory::Video => write!(f, "Video"),
        }
    }
}

impl std::str::FromStr for MediaCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(MediaCategory::All),
            "audio" => Ok(MediaCategory::Audio),
            "conference" => Ok(MediaCategory::Conference),
            "im" => Ok(MediaCategory::Im),
            "video" => Ok(MediaCategory::Video),
            _ => Err(format!("Unknown session category: {}", s)),
        }
    }
}
