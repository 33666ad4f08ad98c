//! Fuzz target for whole-sheet synthesis.
//!
//! Builds payment sheets of arbitrary shape and content around the
//! required columns and checks the run either fails with a configuration
//! error or yields every anomaly class.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mepsynth::prelude::*;

/// Arbitrary cell content.
#[derive(Debug, Arbitrary)]
enum FuzzCell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Days(u16),
}

impl FuzzCell {
    fn into_cell(self) -> CellValue {
        match self {
            FuzzCell::Empty => CellValue::Empty,
            FuzzCell::Text(s) => CellValue::Text(s),
            FuzzCell::Number(n) => CellValue::Number(n),
            FuzzCell::Bool(b) => CellValue::Bool(b),
            FuzzCell::Days(d) => chrono::NaiveDate::from_ymd_opt(2000, 1, 1)
                .and_then(|base| base.checked_add_days(chrono::Days::new(d as u64)))
                .map(CellValue::Date)
                .unwrap_or_default(),
        }
    }
}

/// Fuzz input: extra columns, rows and run parameters.
#[derive(Debug, Arbitrary)]
struct FuzzInput {
    /// Names of extra columns placed after the required ones.
    extra_columns: Vec<String>,
    /// Raw rows; missing cells are blank.
    rows: Vec<Vec<FuzzCell>>,
    seed: u64,
    bonus_rate: u8,
}

fuzz_target!(|input: FuzzInput| {
    if input.rows.len() > 256 || input.extra_columns.len() > 16 {
        return;
    }

    let config = SynthConfig {
        seed: input.seed,
        bonus_rate: input.bonus_rate as f64 / 255.0,
        reference_date: chrono::NaiveDate::from_ymd_opt(2026, 2, 4),
        ..SynthConfig::default()
    };

    let mut header: Vec<CellValue> = Field::ALL
        .iter()
        .map(|f| CellValue::from(config.columns.column(*f)))
        .collect();
    header.extend(input.extra_columns.into_iter().map(CellValue::Text));
    let mut grid = vec![header];
    grid.extend(
        input
            .rows
            .into_iter()
            .map(|row| row.into_iter().map(FuzzCell::into_cell).collect()),
    );
    let workbook = Workbook::new().with_sheet(Sheet::new("MEP", grid));

    let assembler = DatasetAssembler::new(config).expect("default config is valid");
    match assembler.synthesize(&workbook) {
        Ok((_, report)) => assert!(report.missing().is_empty()),
        Err(e) => assert!(e.is_configuration(), "unexpected error: {}", e),
    }
});
