use crate::types::{MediaCategory, SessionRecord};

/// Attribute predicates applied to every fetched batch.
///
/// All predicates are optional and AND-combined. Substring matching is
/// case-insensitive throughout.
#[derive(Debug, Clone, Default)]
pub struct Predicates {
    /// Keep records whose media descriptors mention this category.
    pub category: MediaCategory,
    /// Keep records where either endpoint URI contains this text.
    pub uri_contains: Option<String>,
    /// Keep records where either endpoint's client version contains this text.
    pub client_version_contains: Option<String>,
    /// When false, records without an end time are dropped.
    pub include_incomplete: bool,
}

impl Predicates {
    pub fn matches(&self, record: &SessionRecord) -> bool {
        if let Some(token) = self.category.token() {
            if !record.media_types.to_lowercase().contains(token) {
                return false;
            }
        }

        if let Some(ref needle) = self.uri_contains {
            let needle = needle.to_lowercase();
            if !record.from_uri.to_lowercase().contains(&needle)
                && !record.to_uri.to_lowercase().contains(&needle)
            {
                return false;
            }
        }

        if let Some(ref needle) = self.client_version_contains {
            let needle = needle.to_lowercase();
            if !record.from_client_version.to_lowercase().contains(&needle)
                && !record.to_client_version.to_lowercase().contains(&needle)
            {
                return false;
            }
        }

        if !self.include_incomplete && record.is_incomplete() {
            return false;
        }

        true
    }
}

/// Apply `predicates` to a batch, preserving order.
pub fn apply(batch: &[SessionRecord], predicates: &Predicates) -> Vec<SessionRecord> {
    batch
        .iter()
        .filter(|record| predicates.matches(record))
        .cloned()
        .collect()
}
