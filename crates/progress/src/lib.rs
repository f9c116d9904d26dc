//! Progress tracking.
//!
//! The progress store (completed verses per user) and the metrics derived
//! from it: Juzz completed, percentage, and time-to-finish estimates.

#![warn(missing_docs)]

pub mod tracker;
pub mod estimator;

pub use tracker::{ProgressStore, ProgressError, Result, range_entries};
pub use estimator::{
    estimated_time_remaining, juzz_completed, percent_complete, remaining_juzz, round2,
    HifzEstimate, ProgressReport, TOTAL_JUZZ, VERSES_PER_JUZZ,
};
