//! Resolution of role columns and detected secondary columns.

use super::{ColumnClassifier, Table};
use crate::config::{DetectionConfig, RoleMapping};
use crate::error::{Result, SynthError};
use crate::types::Field;

/// A detected amount-like column left untouched by the synthesizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedColumn {
    /// Column position.
    pub index: usize,
    /// Column name.
    pub name: String,
}

/// Where each semantic role and each detected column lives in a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    roles: [usize; 7],
    amount_columns: Vec<usize>,
    country_columns: Vec<usize>,
    secondary_amounts: Vec<usize>,
    skipped_amounts: Vec<SkippedColumn>,
}

impl TableLayout {
    /// Resolve role columns by exact name and detect amount- and
    /// country-like columns.
    ///
    /// Secondary amount columns (amount-like, other than the primary amount)
    /// that hold text are recorded as skipped instead of writable. The
    /// decision is taken once, on the input content.
    pub fn resolve(
        table: &Table,
        mapping: &RoleMapping,
        classifier: &dyn ColumnClassifier,
        detection: &DetectionConfig,
    ) -> Result<Self> {
        let mut roles = [0usize; 7];
        for field in Field::ALL {
            let name = mapping.column(field);
            roles[field as usize] =
                table
                    .column_index(name)
                    .ok_or_else(|| SynthError::MissingColumn {
                        role: field.name().to_string(),
                        column: name.to_string(),
                        available: table.column_names(),
                    })?;
        }

        let names = table.column_names();
        let amount_columns: Vec<usize> = (0..names.len())
            .filter(|&i| classifier.is_amount_like(&names[i]))
            .collect();
        let country_columns: Vec<usize> = (0..names.len())
            .filter(|&i| classifier.is_country_like(&names[i]))
            .collect();

        let primary = roles[Field::Amount as usize];
        let mut secondary_amounts = Vec::new();
        let mut skipped_amounts = Vec::new();
        for &index in amount_columns.iter().filter(|&&i| i != primary) {
            let column = table.column(index);
            if column.looks_textual(detection.text_sample_size, detection.text_alpha_ratio) {
                tracing::debug!(
                    column = column.name(),
                    kind = ?column.kind(),
                    "amount-like column holds text, leaving it untouched"
                );
                skipped_amounts.push(SkippedColumn {
                    index,
                    name: column.name().to_string(),
                });
            } else {
                secondary_amounts.push(index);
            }
        }

        Ok(Self {
            roles,
            amount_columns,
            country_columns,
            secondary_amounts,
            skipped_amounts,
        })
    }

    /// Column position of a role.
    pub fn column(&self, field: Field) -> usize {
        self.roles[field as usize]
    }

    /// Every amount-like column, primary included.
    pub fn amount_columns(&self) -> &[usize] {
        &self.amount_columns
    }

    /// Every country-like column.
    pub fn country_columns(&self) -> &[usize] {
        &self.country_columns
    }

    /// Amount-like columns that receive fresh compliant amounts.
    pub fn secondary_amounts(&self) -> &[usize] {
        &self.secondary_amounts
    }

    /// Amount-like columns skipped because they hold text.
    pub fn skipped_amounts(&self) -> &[SkippedColumn] {
        &self.skipped_amounts
    }
}
