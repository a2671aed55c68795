use std::path::PathBuf;

use thiserror::Error;

use callsweep_api::ApiError;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Sign-in failed: {0}")]
    SignIn(#[source] ApiError),

    #[error("Directory lookup for {uri} failed: {source}")]
    Lookup { uri: String, source: ApiError },

    #[error("Directory enumeration failed: {0}")]
    Directory(#[source] ApiError),

    #[error("No enabled user found for {uri}")]
    SubjectNotFound { uri: String },

    #[error("The directory returned no enabled users")]
    EmptyDirectory,

    #[error("Could not read subject list {path:?}: {source}")]
    SubjectList { path: PathBuf, source: csv::Error },

    #[error("Subject list {path:?} has no User column")]
    SubjectListHeader { path: PathBuf },

    #[error("Query for {subject} failed even on a renewed connection: {source}")]
    Query { subject: String, source: ApiError },
}
