//! # callsweep-records
//!
//! Record types and filtering for session history scans.
//!
//! ## Key Types
//!
//! - [`SessionRecord`] - One session row with subject provenance
//! - [`Predicates`] - AND-combined attribute filters
//! - [`TimeWindow`] - Half-open UTC scan interval

pub mod columns;
pub mod filter;
mod types;

pub use filter::Predicates;
pub use types::{MediaCategory, SessionRecord, Subject, TimeWindow};
