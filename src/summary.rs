/// Run accounting.
///
/// [`Summary`] is a plain accumulator: each outcome is folded in with
/// [`Summary::record`], which takes the tally by value and hands back the
/// updated one. [`RunReport`] keeps every outcome next to the final tally and
/// is what `--report` writes as JSON.
use crate::config::OrganizeOptions;
use crate::file_category::Category;
use crate::file_organizer::Outcome;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Counts of what happened during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub moved: usize,
    pub copied: usize,
    /// Dry-run plans.
    pub would_move: usize,
    pub would_copy: usize,
    pub skipped_duplicate: usize,
    pub skipped_error: usize,
    /// Bytes of every moved, copied or planned file.
    pub total_bytes: u64,
}

impl Summary {
    /// Creates an empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one outcome into the tally.
    ///
    /// # Examples
    ///
    /// ```
    /// use dirsort::file_organizer::Outcome;
    /// use dirsort::summary::Summary;
    /// use std::path::PathBuf;
    ///
    /// let summary = Summary::new().record(&Outcome::SkippedError {
    ///     source: PathBuf::from("locked.pdf"),
    ///     reason: "permission denied".to_string(),
    /// });
    /// assert_eq!(summary.skipped_error, 1);
    /// ```
    pub fn record(mut self, outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Moved(p) => {
                self.moved += 1;
                self.total_bytes += p.bytes;
            }
            Outcome::Copied(p) => {
                self.copied += 1;
                self.total_bytes += p.bytes;
            }
            Outcome::WouldMove(p) => {
                self.would_move += 1;
                self.total_bytes += p.bytes;
            }
            Outcome::WouldCopy(p) => {
                self.would_copy += 1;
                self.total_bytes += p.bytes;
            }
            Outcome::SkippedDuplicate { .. } => self.skipped_duplicate += 1,
            Outcome::SkippedError { .. } => self.skipped_error += 1,
        }
        self
    }

    /// Files that were (or would be) placed.
    pub fn placed(&self) -> usize {
        self.moved + self.copied + self.would_move + self.would_copy
    }

    /// Returns the total number of files processed.
    pub fn total_processed(&self) -> usize {
        self.placed() + self.skipped_duplicate + self.skipped_error
    }

    /// Returns true if no file failed.
    pub fn is_complete_success(&self) -> bool {
        self.skipped_error == 0
    }
}

/// Everything a run did, in processing order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub source: PathBuf,
    pub dest: PathBuf,
    pub options: OrganizeOptions,
    pub outcomes: Vec<Outcome>,
    pub summary: Summary,
}

impl RunReport {
    /// Starts an empty report.
    pub fn new(source: PathBuf, dest: PathBuf, options: OrganizeOptions) -> Self {
        Self {
            started_at: Utc::now(),
            source,
            dest,
            options,
            outcomes: Vec::new(),
            summary: Summary::new(),
        }
    }

    /// Appends an outcome and updates the summary.
    pub fn push(&mut self, outcome: Outcome) {
        self.summary = self.summary.record(&outcome);
        self.outcomes.push(outcome);
    }

    /// Placed (or planned) file counts per category, sorted by category.
    pub fn category_counts(&self) -> BTreeMap<Category, usize> {
        let mut counts = BTreeMap::new();
        for placement in self.outcomes.iter().filter_map(Outcome::placement) {
            *counts.entry(placement.category).or_insert(0) += 1;
        }
        counts
    }

    /// Serializes the report as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
