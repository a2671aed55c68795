//! CSV report sink.
//!
//! The file is created and the header flushed before the scan starts, so
//! an unwritable path fails before any network work.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use callsweep_records::{columns, SessionRecord};

pub struct CsvReport {
    writer: csv::Writer<File>,
    path: PathBuf,
    full_detail: bool,
}

impl CsvReport {
    pub fn create(path: &Path, full_detail: bool) -> Result<Self> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create report file {}", path.display()))?;
        writer
            .write_record(columns::header(full_detail))
            .context("Failed to write the report header")?;
        writer.flush().context("Failed to write the report header")?;
        Ok(Self {
            writer,
            path: path.to_path_buf(),
            full_detail,
        })
    }

    pub fn write_records(&mut self, records: &[SessionRecord]) -> Result<()> {
        for record in records {
            self.writer
                .write_record(columns::row(record, self.full_detail))
                .with_context(|| format!("Failed to write session {}", record.id))?;
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<PathBuf> {
        self.writer.flush().context("Failed to flush the report")?;
        Ok(self.path)
    }
}
