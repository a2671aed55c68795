use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use callsweep_records::{SessionRecord, Subject};

/// One session row as the service reports it.
///
/// Fields the scan does not model are collected into `extra` so
/// full-detail runs can carry them through to the report.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRow {
    pub id: String,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    pub from_uri: String,
    pub to_uri: String,
    #[serde(default)]
    pub from_number: Option<String>,
    #[serde(default)]
    pub to_number: Option<String>,
    #[serde(default)]
    pub referred_by: Option<String>,
    #[serde(default)]
    pub from_client_version: String,
    #[serde(default)]
    pub to_client_version: String,
    #[serde(default)]
    pub media_types: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl SessionRow {
    /// Convert to a report record, stamping which subject the row was
    /// fetched for.
    pub fn into_record(self, subject: &Subject, keep_detail: bool) -> SessionRecord {
        SessionRecord {
            id: self.id,
            start_time: self.start_time,
            end_time: self.end_time,
            from_uri: self.from_uri,
            to_uri: self.to_uri,
            from_number: self.from_number,
            to_number: self.to_number,
            referred_by: self.referred_by,
            from_client_version: self.from_client_version,
            to_client_version: self.to_client_version,
            media_types: self.media_types.join(", "),
            subject_uri: subject.uri.clone(),
            subject_display_name: subject.display_name.clone(),
            detail: if keep_detail {
                self.extra
            } else {
                BTreeMap::new()
            },
        }
    }
}

/// A directory principal row.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRow {
    pub uri: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub enabled: bool,
}

impl From<UserRow> for Subject {
    fn from(row: UserRow) -> Self {
        Subject {
            uri: row.uri,
            display_name: row.display_name,
            enabled: row.enabled,
        }
    }
}

/// Response of the token grant endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenGrant {
    pub access_token: String,
}
