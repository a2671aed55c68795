use std::path::{Path, PathBuf};

use tracing::{info, warn};

use callsweep_api::{ConnectionSupervisor, DirectoryLookup};
use callsweep_records::Subject;

use crate::error::ScanError;

/// Where the subject roster comes from, in precedence order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectSource {
    /// A single URI named on the command line.
    Explicit(String),
    /// A CSV file with a `User` column.
    File(PathBuf),
    /// Every enabled user in the service directory.
    Directory,
}

/// Pick the roster source. An explicit subject wins over a list file, and
/// the full directory is the fallback.
pub fn subject_source(subject: Option<&str>, file: Option<&Path>) -> SubjectSource {
    if let Some(uri) = subject {
        SubjectSource::Explicit(uri.to_string())
    } else if let Some(path) = file {
        SubjectSource::File(path.to_path_buf())
    } else {
        SubjectSource::Directory
    }
}

/// Lowercase a user URI and give it a `sip:` scheme when missing.
pub fn normalize_uri(raw: &str) -> String {
    let trimmed = raw.trim().to_ascii_lowercase();
    if trimmed.starts_with("sip:") {
        trimmed
    } else {
        format!("sip:{trimmed}")
    }
}

/// Turns a roster source into concrete directory subjects.
pub struct SubjectResolver<'a> {
    directory: &'a dyn DirectoryLookup,
    supervisor: &'a mut ConnectionSupervisor,
}

impl<'a> SubjectResolver<'a> {
    pub fn new(
        directory: &'a dyn DirectoryLookup,
        supervisor: &'a mut ConnectionSupervisor,
    ) -> Self {
        Self {
            directory,
            supervisor,
        }
    }

    /// Resolve the roster to scan, sorted by URI.
    pub async fn resolve(&mut self, source: &SubjectSource) -> Result<Vec<Subject>, ScanError> {
        let mut subjects = match source {
            SubjectSource::Explicit(uri) => self.resolve_explicit(uri).await?,
            SubjectSource::File(path) => self.resolve_file(path).await?,
            SubjectSource::Directory => self.resolve_directory().await?,
        };
        subjects.sort_by(|a, b| a.uri.cmp(&b.uri));
        Ok(subjects)
    }

    async fn lookup(&mut self, uri: &str) -> Result<Option<Subject>, ScanError> {
        let handle = self
            .supervisor
            .ensure_live()
            .await
            .map_err(ScanError::SignIn)?;
        self.directory
            .find_user(handle, uri)
            .await
            .map_err(|source| ScanError::Lookup {
                uri: uri.to_string(),
                source,
            })
    }

    async fn resolve_explicit(&mut self, raw: &str) -> Result<Vec<Subject>, ScanError> {
        let uri = normalize_uri(raw);
        match self.lookup(&uri).await? {
            Some(subject) if subject.enabled => Ok(vec![subject]),
            _ => Err(ScanError::SubjectNotFound { uri }),
        }
    }

    /// Read a roster file. Rows the directory does not know are skipped
    /// with a warning rather than failing the run.
    async fn resolve_file(&mut self, path: &Path) -> Result<Vec<Subject>, ScanError> {
        let mut reader = csv::Reader::from_path(path).map_err(|source| ScanError::SubjectList {
            path: path.to_path_buf(),
            source,
        })?;
        let headers = reader.headers().map_err(|source| ScanError::SubjectList {
            path: path.to_path_buf(),
            source,
        })?;
        let column = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case("user"))
            .ok_or_else(|| ScanError::SubjectListHeader {
                path: path.to_path_buf(),
            })?;

        let mut subjects = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|source| ScanError::SubjectList {
                path: path.to_path_buf(),
                source,
            })?;
            let Some(cell) = row.get(column) else {
                continue;
            };
            if cell.trim().is_empty() {
                continue;
            }
            let uri = normalize_uri(cell);
            match self.lookup(&uri).await? {
                Some(subject) if subject.enabled => subjects.push(subject),
                _ => warn!(%uri, "Subject list entry is not an enabled user; skipping"),
            }
        }
        info!(
            count = subjects.len(),
            path = %path.display(),
            "Loaded subject list"
        );
        Ok(subjects)
    }

    async fn resolve_directory(&mut self) -> Result<Vec<Subject>, ScanError> {
        let handle = self
            .supervisor
            .ensure_live()
            .await
            .map_err(ScanError::SignIn)?;
        let subjects = self
            .directory
            .enabled_users(handle)
            .await
            .map_err(ScanError::Directory)?;
        if subjects.is_empty() {
            return Err(ScanError::EmptyDirectory);
        }
        Ok(subjects)
    }
}
