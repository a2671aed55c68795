use tracing::info;

use callsweep_api::{ConnectionSupervisor, SessionQuery};
use callsweep_records::Subject;

use crate::context::RunContext;
use crate::error::ScanError;
use crate::outcome::ScanReport;
use crate::scanner::SubjectScanner;

/// Called before each subject with its index in the roster.
pub type ProgressCallback = Box<dyn Fn(usize, &Subject) + Send>;

/// Drives a full scan across a roster of subjects.
pub struct ScanRunner<'a> {
    scanner: SubjectScanner<'a>,
    progress: Option<ProgressCallback>,
}

impl<'a> ScanRunner<'a> {
    pub fn new(query: &'a dyn SessionQuery, supervisor: &'a mut ConnectionSupervisor) -> Self {
        Self {
            scanner: SubjectScanner::new(query, supervisor),
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Scan every subject in roster order and merge the results. A fatal
    /// error discards the partial results.
    pub async fn run(
        &mut self,
        subjects: &[Subject],
        context: &mut RunContext,
    ) -> Result<ScanReport, ScanError> {
        let mut records = Vec::new();
        let mut truncated_subjects = Vec::new();

        for (index, subject) in subjects.iter().enumerate() {
            if let Some(progress) = &self.progress {
                progress(index, subject);
            }
            let scan = self.scanner.scan_subject(subject, context).await?;
            context.note_subject();
            info!(
                subject = %scan.subject,
                sessions = scan.records.len(),
                passes = scan.passes,
                "Subject complete"
            );
            if scan.truncated {
                truncated_subjects.push(scan.subject);
            }
            records.extend(scan.records);
        }

        Ok(ScanReport {
            records,
            truncated_subjects,
            summary: context.summary(),
        })
    }
}
