use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use callsweep_api::{ConnectionSupervisor, SessionQuery};
use callsweep_records::{filter, SessionRecord, Subject, TimeWindow};

use crate::context::RunContext;
use crate::error::ScanError;
use crate::outcome::SubjectScan;

/// Most rows one query can return. The service applies this cap on its
/// side and offers no continuation token.
pub const PAGE_CAP: usize = 1000;

/// Upper bound on window advances for one subject. A window that still
/// has more after this many passes is cut off and reported truncated.
pub const MAX_PASSES: u32 = 100;

/// Walks one subject through the scan window page by page.
pub struct SubjectScanner<'a> {
    query: &'a dyn SessionQuery,
    supervisor: &'a mut ConnectionSupervisor,
}

impl<'a> SubjectScanner<'a> {
    pub fn new(query: &'a dyn SessionQuery, supervisor: &'a mut ConnectionSupervisor) -> Self {
        Self { query, supervisor }
    }

    /// Fetch every session for `subject` inside the context window.
    ///
    /// A response of [`PAGE_CAP`] rows means more may remain, so the next
    /// pass re-queries with the window's start moved up to the latest end
    /// time seen so far. Sessions that ended exactly on that boundary come
    /// back again; callers get at most one duplicate per page pair and no
    /// missing rows.
    pub async fn scan_subject(
        &mut self,
        subject: &Subject,
        context: &mut RunContext,
    ) -> Result<SubjectScan, ScanError> {
        let mut cursor = context.window.start;
        let mut records = Vec::new();
        let mut passes = 0u32;
        let mut truncated = false;

        loop {
            let window = context.window.starting_at(cursor);
            let batch = self.fetch(subject, window).await?;
            passes += 1;

            let matched = filter::apply(&batch, &context.predicates);
            context.note_batch(batch.len(), matched.len());
            debug!(
                subject = %subject.uri,
                pass = passes,
                fetched = batch.len(),
                matched = matched.len(),
                "Page complete"
            );
            records.extend(matched);

            if batch.len() < PAGE_CAP {
                break;
            }

            match next_cursor(&batch) {
                Some(next) if next > cursor => cursor = next,
                _ => {
                    warn!(
                        subject = %subject.uri,
                        "Full page with no later end time; results may be truncated"
                    );
                    truncated = true;
                    break;
                }
            }

            if passes >= MAX_PASSES {
                warn!(
                    subject = %subject.uri,
                    passes,
                    "Pass bound reached; results may be truncated"
                );
                truncated = true;
                break;
            }
        }

        Ok(SubjectScan {
            subject: subject.uri.clone(),
            records,
            passes,
            truncated,
        })
    }

    /// One query against the service, retried once behind a renewed
    /// connection when the first attempt fails.
    async fn fetch(
        &mut self,
        subject: &Subject,
        window: TimeWindow,
    ) -> Result<Vec<SessionRecord>, ScanError> {
        let handle = self
            .supervisor
            .ensure_live()
            .await
            .map_err(ScanError::SignIn)?;
        match self.query.sessions(handle, subject, window).await {
            Ok(batch) => Ok(batch),
            Err(first) => {
                warn!(
                    subject = %subject.uri,
                    error = %first,
                    "Query failed; renewing the connection and retrying"
                );
                let handle = self
                    .supervisor
                    .force_renew()
                    .await
                    .map_err(ScanError::SignIn)?;
                self.query
                    .sessions(handle, subject, window)
                    .await
                    .map_err(|source| ScanError::Query {
                        subject: subject.uri.clone(),
                        source,
                    })
            }
        }
    }
}

/// Latest end time in a batch. Rows still open have no end time and never
/// drive the cursor.
fn next_cursor(batch: &[SessionRecord]) -> Option<DateTime<Utc>> {
    batch.iter().filter_map(|r| r.end_time).max()
}
