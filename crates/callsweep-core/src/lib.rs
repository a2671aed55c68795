mod context;
mod error;
mod outcome;
mod resolver;
mod run;
mod scanner;

pub use context::{RunContext, RunCounters};
pub use error::ScanError;
pub use outcome::{RunSummary, ScanReport, SubjectScan};
pub use resolver::{normalize_uri, subject_source, SubjectResolver, SubjectSource};
pub use run::{ProgressCallback, ScanRunner};
pub use scanner::{SubjectScanner, MAX_PASSES, PAGE_CAP};
