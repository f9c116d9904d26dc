//! Progress metrics and completion time estimation.
//!
//! Everything here is a pure function of a completed-verse count. No
//! clamping is applied: counts beyond the reference table give more than
//! 100% and a negative remainder.

use hifz_core::TOTAL_VERSES;

/// Average number of verses in one Juzz.
pub const VERSES_PER_JUZZ: f64 = 604.0;

/// Number of Juzz in the full text.
pub const TOTAL_JUZZ: f64 = 30.0;

/// Round to two decimal places, half away from zero. Never returns
/// negative zero, so a zero result always displays as `0.00`.
pub fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Juzz completed, rounded to two decimals.
pub fn juzz_completed(completed_verses: usize) -> f64 {
    round2(completed_verses as f64 / VERSES_PER_JUZZ)
}

/// Percentage of the reference table completed, rounded to two decimals.
pub fn percent_complete(completed_verses: usize) -> f64 {
    round2(completed_verses as f64 / TOTAL_VERSES as f64 * 100.0)
}

/// Juzz still to memorize, based on the rounded Juzz completed.
pub fn remaining_juzz(completed_verses: usize) -> f64 {
    TOTAL_JUZZ - juzz_completed(completed_verses)
}

/// Time needed for the remaining Juzz at `time_per_juzz` units each,
/// rounded to two decimals.
pub fn estimated_time_remaining(remaining_juzz: f64, time_per_juzz: i64) -> f64 {
    round2(remaining_juzz * time_per_juzz as f64)
}

/// A user's progress summary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressReport {
    /// Entries in the user's record
    pub completed_verses: usize,
    /// Juzz completed
    pub juzz: f64,
    /// Percentage of the reference table
    pub percent: f64,
}

impl ProgressReport {
    /// Build a report for a completed-verse count.
    pub fn for_count(completed_verses: usize) -> Self {
        Self {
            completed_verses,
            juzz: juzz_completed(completed_verses),
            percent: percent_complete(completed_verses),
        }
    }
}

/// How long the rest of the memorization will take.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HifzEstimate {
    /// Juzz remaining
    pub remaining_juzz: f64,
    /// Remaining Juzz times the time per Juzz
    pub estimated_time: f64,
}

impl HifzEstimate {
    /// Estimate for a completed-verse count and time per Juzz.
    pub fn new(completed_verses: usize, time_per_juzz: i64) -> Self {
        let remaining = remaining_juzz(completed_verses);
        Self {
            remaining_juzz: remaining,
            estimated_time: estimated_time_remaining(remaining, time_per_juzz),
        }
    }
}
