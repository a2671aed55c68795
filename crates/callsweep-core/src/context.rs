use std::time::{Duration, Instant};

use callsweep_records::{Predicates, TimeWindow};

use crate::outcome::RunSummary;

/// Shared state for one scan run.
///
/// The window and predicates are fixed for the life of the run; the
/// counters accumulate as batches come back.
pub struct RunContext {
    pub window: TimeWindow,
    pub predicates: Predicates,
    pub counters: RunCounters,
    started_at: Instant,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RunCounters {
    pub subjects: u64,
    pub raw_sessions: u64,
    pub matched: u64,
}

impl RunContext {
    pub fn new(window: TimeWindow, predicates: Predicates) -> Self {
        Self {
            window,
            predicates,
            counters: RunCounters::default(),
            started_at: Instant::now(),
        }
    }

    /// Record one fetched batch. Called once per successful fetch, so a
    /// batch that needed a retry still counts a single time.
    pub fn note_batch(&mut self, raw: usize, matched: usize) {
        self.counters.raw_sessions += raw as u64;
        self.counters.matched += matched as u64;
    }

    pub fn note_subject(&mut self) {
        self.counters.subjects += 1;
    }

    pub fn total_duration(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            subjects: self.counters.subjects,
            raw_sessions: self.counters.raw_sessions,
            matched: self.counters.matched,
            elapsed: self.total_duration(),
        }
    }
}
