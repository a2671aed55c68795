//! Report column layout shared by the CSV sink and the viewer.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::types::SessionRecord;

/// Columns every report carries, in order.
pub const BASE_COLUMNS: [&str; 13] = [
    "subject_uri",
    "subject_display_name",
    "session_id",
    "start_time",
    "end_time",
    "from_uri",
    "to_uri",
    "from_number",
    "to_number",
    "referred_by",
    "from_client_version",
    "to_client_version",
    "media_types",
];

/// Extra column appended in full-detail runs.
pub const DETAIL_COLUMN: &str = "detail";

pub fn header(full_detail: bool) -> Vec<&'static str> {
    let mut columns = BASE_COLUMNS.to_vec();
    if full_detail {
        columns.push(DETAIL_COLUMN);
    }
    columns
}

pub fn row(record: &SessionRecord, full_detail: bool) -> Vec<String> {
    let mut values = vec![
        record.subject_uri.clone(),
        record.subject_display_name.clone(),
        record.id.clone(),
        format_instant(record.start_time),
        format_instant(record.end_time),
        record.from_uri.clone(),
        record.to_uri.clone(),
        record.from_number.clone().unwrap_or_default(),
        record.to_number.clone().unwrap_or_default(),
        record.referred_by.clone().unwrap_or_default(),
        record.from_client_version.clone(),
        record.to_client_version.clone(),
        record.media_types.clone(),
    ];
    if full_detail {
        values.push(serde_json::to_string(&record.detail).unwrap_or_default());
    }
    values
}

/// RFC 3339 with second precision, empty for missing instants.
pub fn format_instant(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}
