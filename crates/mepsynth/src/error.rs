//! Error types for dataset synthesis.

use thiserror::Error;

/// Result type for synthesis operations.
pub type Result<T> = std::result::Result<T, SynthError>;

/// Errors that abort a synthesis run.
///
/// Every variant is fatal. Cell-level degradations are reported through
/// [`crate::factory::SynthWarning`] instead and never surface here.
#[derive(Error, Debug)]
pub enum SynthError {
    /// The target sheet is not present in the workbook.
    #[error("Sheet '{sheet}' not found. Available sheets: {available:?}")]
    SheetNotFound {
        /// Requested sheet name.
        sheet: String,
        /// Sheets present in the workbook.
        available: Vec<String>,
    },

    /// A required role column is not present in the target sheet.
    #[error("Column not found: {role} -> '{column}'. Columns: {available:?}")]
    MissingColumn {
        /// Semantic role that could not be resolved.
        role: String,
        /// Configured column name for that role.
        column: String,
        /// Column names present in the sheet header.
        available: Vec<String>,
    },

    /// The table has fewer records than anomaly classes to guarantee.
    #[error("Not enough records ({records}) to guarantee {classes} anomaly classes")]
    InsufficientRecords {
        /// Records in the table.
        records: usize,
        /// Anomaly classes that must each appear once.
        classes: usize,
    },

    /// The header row offset points past the end of the sheet.
    #[error("Header row {header_row} is outside sheet '{sheet}' ({rows} rows)")]
    InvalidHeaderRow {
        /// Sheet name.
        sheet: String,
        /// Configured header row offset.
        header_row: usize,
        /// Rows present in the sheet.
        rows: usize,
    },

    /// Configuration values are inconsistent.
    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    /// Workbook adapter failure (read or write).
    #[error("Workbook error: {0}")]
    Workbook(String),

    /// Configuration file could not be parsed.
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SynthError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a workbook adapter error.
    pub fn workbook(msg: impl Into<String>) -> Self {
        Self::Workbook(msg.into())
    }

    /// Whether the error was raised before any record was synthesized.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::SheetNotFound { .. }
                | Self::MissingColumn { .. }
                | Self::InsufficientRecords { .. }
                | Self::InvalidHeaderRow { .. }
                | Self::InvalidConfig(_)
                | Self::ConfigParse(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_message_names_role_and_columns() {
        let err = SynthError::MissingColumn {
            role: "bic".to_string(),
            column: "BIC".to_string(),
            available: vec!["IBAN".to_string(), "Numéro".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("bic -> 'BIC'"));
        assert!(msg.contains("IBAN"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_workbook_error_is_not_configuration() {
        assert!(!SynthError::workbook("disk full").is_configuration());
    }
}
