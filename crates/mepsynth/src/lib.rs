//! Synthetic payment-sheet generation.
//!
//! Rewrites the payment sheet of a workbook with synthetic records while
//! keeping its shape, so the downstream reviewer's rules still have
//! something to find.
//!
//! # Features
//!
//! - **Rule catalog**: eight anomaly classes, each bound to one field
//! - **Field generators**: compliant and violating values per field
//! - **Scheduler**: one forced record per class plus bonus anomalies at a
//!   fixed rate
//! - **Reviewer**: the detection predicates, usable to audit any workbook
//! - **XLSX I/O**: `calamine` import and `rust_xlsxwriter` export behind the
//!   `xlsx` feature
//!
//! A run is deterministic: same seed, same input and same reference date
//! give the same output.

pub mod config;
pub mod error;
pub mod factory;
pub mod rules;
pub mod table;
pub mod types;

pub use config::SynthConfig;
pub use error::{Result, SynthError};
pub use factory::{
    AnomalyScheduler, DatasetAssembler, FieldGenerators, Outcome, RecordSynthesizer, SynthReport,
    SynthWarning,
};
pub use rules::{audit_table, AuditReport, ReviewRules};
pub use types::{AnomalyClass, Field, Record};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{DetectionConfig, GenerationConfig, RoleMapping, RuleConfig, SynthConfig};
    pub use crate::error::{Result, SynthError};
    pub use crate::factory::{DatasetAssembler, SynthReport, SynthWarning};
    pub use crate::rules::{audit_table, AuditReport, ReviewRules};
    pub use crate::table::{
        CellValue, ColumnClassifier, KeywordClassifier, Sheet, Table, TableLayout, Workbook,
        WorkbookReader, WorkbookWriter,
    };
    #[cfg(feature = "xlsx")]
    pub use crate::table::{XlsxReader, XlsxWriter};
    pub use crate::types::{AnomalyClass, Field, Record};
}
