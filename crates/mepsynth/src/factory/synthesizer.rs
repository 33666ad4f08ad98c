//! Per-record synthesis and table writes.

use super::{AnomalyScheduler, FieldGenerators, Outcome, SynthWarning};
use crate::table::{format_number, CellValue, Table, TableLayout};
use crate::types::{Field, Record};
use rand::prelude::*;

/// Builds one record per table row and writes it in place.
#[derive(Debug, Clone)]
pub struct RecordSynthesizer {
    generators: FieldGenerators,
    layout: TableLayout,
    header_row: usize,
}

impl RecordSynthesizer {
    /// Create a synthesizer for a resolved layout.
    pub fn new(generators: FieldGenerators, layout: TableLayout, header_row: usize) -> Self {
        Self {
            generators,
            layout,
            header_row,
        }
    }

    /// Layout the synthesizer writes to.
    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    /// Cast text role columns to text and coerce the primary amount column
    /// to numbers. Call once before writing any record.
    pub fn prepare(&self, table: &mut Table) {
        for field in Field::ALL.into_iter().filter(Field::is_text) {
            table.column_mut(self.layout.column(field)).cast_text();
        }

        let amount = table.column_mut(self.layout.column(Field::Amount));
        let cleared = amount.coerce_numeric();
        if cleared > 0 {
            tracing::debug!(column = amount.name(), cleared, "primary amount column coerced");
        }
    }

    /// Spreadsheet row number of record `index` (1-based, header included).
    pub fn sheet_row(&self, index: usize) -> usize {
        index + self.header_row + 2
    }

    /// Generate record `index`: every field compliant, then at most one
    /// field overridden by the scheduled class.
    pub fn synthesize(
        &self,
        index: usize,
        scheduler: &AnomalyScheduler,
        rng: &mut impl Rng,
    ) -> (Record, Outcome) {
        let mut record = self.generators.compliant(self.sheet_row(index), rng);
        let outcome = scheduler.resolve(index, rng);
        if let Some(class) = outcome.class() {
            self.generators.violate(class, &mut record, rng);
        }
        (record, outcome)
    }

    /// Write `record` into row `index`, then fill secondary amount and
    /// country columns.
    pub fn write(
        &self,
        table: &mut Table,
        index: usize,
        record: &Record,
        rng: &mut impl Rng,
    ) -> Option<SynthWarning> {
        for field in [
            Field::Beneficiary,
            Field::InvoiceNumber,
            Field::Iban,
            Field::Bic,
            Field::BankCountry,
            Field::AccountEndDate,
        ] {
            table.set(index, self.layout.column(field), record.cell(field));
        }

        let amount_col = self.layout.column(Field::Amount);
        // A cell cannot hold a non-finite number.
        let warning = if !record.amount.is_finite() {
            let value = format_number(record.amount.trunc());
            table.set(index, amount_col, CellValue::Text(value.clone()));
            let column = table.column(amount_col).name().to_string();
            tracing::debug!(row = index, column = %column, value = %value, "amount written as text");
            Some(SynthWarning::AmountWrittenAsText {
                row: index,
                column,
                value,
            })
        } else {
            table.set(index, amount_col, CellValue::Number(record.amount));
            None
        };

        for &col in self.layout.secondary_amounts() {
            table.set(index, col, CellValue::Number(self.generators.amount(rng)));
        }
        for &col in self.layout.country_columns() {
            table.set(index, col, CellValue::Text(record.bank_country.clone()));
        }

        warning
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DetectionConfig, GenerationConfig, RoleMapping, RuleConfig};
    use crate::table::{Column, ColumnKind, KeywordClassifier};
    use chrono::NaiveDate;
    use rand::rngs::StdRng;

    fn generators() -> FieldGenerators {
        FieldGenerators::new(
            &RuleConfig::default(),
            &GenerationConfig::default(),
            NaiveDate::from_ymd_opt(2026, 2, 4).unwrap(),
        )
    }

    fn table(rows: usize, amount: Vec<CellValue>, extra: Vec<Column>) -> Table {
        let mapping = RoleMapping::default();
        let mut columns: Vec<Column> = Field::ALL
            .iter()
            .map(|f| {
                if *f == Field::Amount {
                    Column::new(mapping.column(*f), amount.clone())
                } else {
                    Column::new(mapping.column(*f), vec![CellValue::Number(1.0); rows])
                }
            })
            .collect();
        columns.extend(extra);
        Table::from_columns(columns)
    }

    fn synthesizer(table: &Table) -> RecordSynthesizer {
        let layout = TableLayout::resolve(
            table,
            &RoleMapping::default(),
            &KeywordClassifier::default(),
            &DetectionConfig::default(),
        )
        .unwrap();
        RecordSynthesizer::new(generators(), layout, 0)
    }

    #[test]
    fn test_writes_roles_and_secondary_columns() {
        let mut table = table(
            8,
            vec![CellValue::Number(5.0); 8],
            vec![
                Column::new("Montant HT", vec![CellValue::Number(1.0); 8]),
                Column::new("Country", vec![CellValue::Empty; 8]),
            ],
        );
        let synth = synthesizer(&table);
        synth.prepare(&mut table);
        assert_eq!(table.column(0).kind(), ColumnKind::Text);

        let mut rng = StdRng::seed_from_u64(11);
        let scheduler = AnomalyScheduler::plan(8, 0.0, &mut rng).unwrap();
        let (record, outcome) = synth.synthesize(3, &scheduler, &mut rng);
        assert!(matches!(outcome, Outcome::Forced(_)));
        assert!(synth.write(&mut table, 3, &record, &mut rng).is_none());

        assert_eq!(table.cell(3, 2), Some(&CellValue::Number(record.amount)));
        assert_eq!(table.cell(3, 3), Some(&CellValue::Date(record.account_end_date)));
        assert_eq!(table.cell(3, 6), Some(&CellValue::Text(record.bank_country.clone())));
        assert_eq!(table.cell(3, 8), Some(&CellValue::Text(record.bank_country.clone())));
        let secondary = table.cell(3, 7).and_then(CellValue::as_number).unwrap();
        assert!((50.0..800_000.0).contains(&secondary));
    }

    #[test]
    fn test_text_amount_column_is_coerced_to_numbers() {
        let mut amounts = vec![CellValue::from("12"); 8];
        amounts[4] = CellValue::from("à voir");
        let mut table = table(8, amounts, Vec::new());
        let synth = synthesizer(&table);
        synth.prepare(&mut table);
        assert_eq!(table.column(2).kind(), ColumnKind::Number);
        assert_eq!(table.cell(4, 2), Some(&CellValue::Empty));

        let mut rng = StdRng::seed_from_u64(12);
        for row in 0..8 {
            let record = generators().compliant(row + 2, &mut rng);
            assert!(synth.write(&mut table, row, &record, &mut rng).is_none());
            assert_eq!(table.cell(row, 2), Some(&CellValue::Number(record.amount)));
        }
        assert_eq!(table.column(2).kind(), ColumnKind::Number);
    }

    #[test]
    fn test_non_finite_amount_falls_back_to_text_for_that_cell() {
        let mut table = table(8, vec![CellValue::Number(5.0); 8], Vec::new());
        let synth = synthesizer(&table);
        synth.prepare(&mut table);

        let mut rng = StdRng::seed_from_u64(12);
        let mut record = generators().compliant(2, &mut rng);
        record.amount = f64::INFINITY;
        let warning = synth.write(&mut table, 0, &record, &mut rng).unwrap();

        assert_eq!(table.cell(0, 2), Some(&CellValue::Text("inf".to_string())));
        assert_eq!(table.cell(1, 2), Some(&CellValue::Number(5.0)));
        assert_eq!(
            warning,
            SynthWarning::AmountWrittenAsText {
                row: 0,
                column: "Total à payer".to_string(),
                value: "inf".to_string(),
            }
        );
    }

    #[test]
    fn test_sheet_row_accounts_for_header_offset() {
        let t = table(8, vec![CellValue::Number(1.0); 8], Vec::new());
        let layout = synthesizer(&t).layout().clone();
        let synth = RecordSynthesizer::new(generators(), layout, 3);
        assert_eq!(synth.sheet_row(0), 5);
    }
}
