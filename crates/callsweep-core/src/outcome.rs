use std::time::Duration;

use callsweep_records::SessionRecord;

/// What one subject's walk through the window produced.
#[derive(Debug)]
pub struct SubjectScan {
    pub subject: String,
    pub records: Vec<SessionRecord>,
    pub passes: u32,
    pub truncated: bool,
}

/// Everything a finished run hands back to the caller.
#[derive(Debug)]
pub struct ScanReport {
    pub records: Vec<SessionRecord>,
    pub truncated_subjects: Vec<String>,
    pub summary: RunSummary,
}

/// Totals printed when a run completes.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub subjects: u64,
    pub raw_sessions: u64,
    pub matched: u64,
    pub elapsed: Duration,
}
