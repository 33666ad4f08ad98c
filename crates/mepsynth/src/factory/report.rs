//! Run report.

use crate::table::SkippedColumn;
use crate::types::{AnomalyClass, Field};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// A recovered per-cell degradation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthWarning {
    /// The amount could not be stored as a number, so this cell holds its
    /// string form.
    AmountWrittenAsText {
        /// Record index.
        row: usize,
        /// Column name.
        column: String,
        /// Text written.
        value: String,
    },
}

impl std::fmt::Display for SynthWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SynthWarning::AmountWrittenAsText { row, column, value } => write!(
                f,
                "row {}: amount written as text '{}' in column '{}'",
                row, value, column
            ),
        }
    }
}

/// What a synthesis run did.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthReport {
    /// Synthesized sheet.
    pub sheet: String,
    /// Records synthesized.
    pub records: usize,
    /// Reference date of the run.
    pub reference_date: NaiveDate,
    /// Role to resolved column name.
    pub roles: BTreeMap<Field, String>,
    /// Detected amount-like columns, primary included.
    pub amount_columns: Vec<String>,
    /// Detected country-like columns.
    pub country_columns: Vec<String>,
    /// Amount-like columns left untouched because they hold text.
    pub skipped_amounts: Vec<SkippedColumn>,
    /// Record index to forced class.
    pub forced: BTreeMap<usize, AnomalyClass>,
    /// Record index to bonus class.
    pub bonus: BTreeMap<usize, AnomalyClass>,
    /// Records flagged per class by the reviewer rules.
    pub counts: BTreeMap<AnomalyClass, usize>,
    /// Per-cell degradations.
    pub warnings: Vec<SynthWarning>,
}

impl SynthReport {
    /// Classes no synthesized record violates. Empty on a successful run.
    pub fn missing(&self) -> Vec<AnomalyClass> {
        AnomalyClass::ALL
            .into_iter()
            .filter(|c| self.counts.get(c).copied().unwrap_or(0) == 0)
            .collect()
    }

    /// Forced plus bonus anomalies.
    pub fn anomalies(&self) -> usize {
        self.forced.len() + self.bonus.len()
    }

    /// Injected class of record `index`, if any.
    pub fn class_of(&self, index: usize) -> Option<AnomalyClass> {
        self.forced
            .get(&index)
            .or_else(|| self.bonus.get(&index))
            .copied()
    }
}
