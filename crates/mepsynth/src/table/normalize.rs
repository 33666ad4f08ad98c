//! Date normalization pass.

use super::{CellValue, ColumnClassifier, ColumnKind, Table};
use chrono::{NaiveDate, NaiveDateTime};

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M:%S"];

/// Parse a date written as text, dropping any time of day.
pub fn parse_date_text(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .map(|dt| dt.date())
        })
}

/// Truncate every date column of `table` to calendar dates.
///
/// A column is a date column when it holds dates or its name is date-like.
/// Cells that cannot be read as a date are cleared. Returns the number of
/// columns normalized. Applying the pass twice is the same as applying it
/// once.
pub fn normalize_dates(table: &mut Table, classifier: &dyn ColumnClassifier) -> usize {
    let mut normalized = 0;
    for index in 0..table.width() {
        let column = table.column(index);
        if column.kind() != ColumnKind::Date && !classifier.is_date_like(column.name()) {
            continue;
        }

        let column = table.column_mut(index);
        let mut cleared = 0usize;
        for cell in column.cells_mut() {
            if cell.is_empty() {
                continue;
            }
            *cell = match cell.as_date() {
                Some(d) => CellValue::Date(d),
                None => {
                    cleared += 1;
                    CellValue::Empty
                }
            };
        }
        column.refresh_kind();
        if cleared > 0 {
            tracing::debug!(column = column.name(), cleared, "cleared non-date cells");
        }
        normalized += 1;
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Column, KeywordClassifier};
    use proptest::prelude::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_date_text() {
        assert_eq!(parse_date_text("2026-02-04"), Some(d(2026, 2, 4)));
        assert_eq!(parse_date_text("04/02/2026"), Some(d(2026, 2, 4)));
        assert_eq!(parse_date_text("2026-02-04 17:30:00"), Some(d(2026, 2, 4)));
        assert_eq!(parse_date_text("bientôt"), None);
        assert_eq!(parse_date_text(""), None);
    }

    #[test]
    fn test_normalizes_named_and_typed_date_columns() {
        let at = d(2026, 2, 4).and_hms_opt(13, 45, 0).unwrap();
        let mut table = Table::from_columns(vec![
            Column::new(
                "Date de fin du compte",
                vec![CellValue::DateTime(at), CellValue::from("05/02/2026"), CellValue::from("n/a")],
            ),
            Column::new(
                "Echeance",
                vec![CellValue::DateTime(at), CellValue::Empty, CellValue::Empty],
            ),
            Column::new("Libellé", vec![CellValue::from("x"), CellValue::Empty, CellValue::Empty]),
        ]);

        let count = normalize_dates(&mut table, &KeywordClassifier::default());
        assert_eq!(count, 2);
        assert_eq!(table.cell(0, 0), Some(&CellValue::Date(d(2026, 2, 4))));
        assert_eq!(table.cell(1, 0), Some(&CellValue::Date(d(2026, 2, 5))));
        assert_eq!(table.cell(2, 0), Some(&CellValue::Empty));
        assert_eq!(table.cell(0, 1), Some(&CellValue::Date(d(2026, 2, 4))));
        assert_eq!(table.cell(0, 2), Some(&CellValue::from("x")));
        assert_eq!(table.column(0).kind(), ColumnKind::Date);
    }

    fn arb_cell() -> impl Strategy<Value = CellValue> {
        prop_oneof![
            Just(CellValue::Empty),
            (0i64..100_000, 0u32..86_400).prop_map(|(days, secs)| {
                let base = d(2000, 1, 1).and_hms_opt(0, 0, 0).unwrap();
                CellValue::DateTime(
                    base + chrono::Duration::days(days) + chrono::Duration::seconds(secs as i64),
                )
            }),
            "[a-z0-9/ -]{0,12}".prop_map(CellValue::Text),
            (-1e6f64..1e6).prop_map(CellValue::Number),
        ]
    }

    proptest! {
        #[test]
        fn prop_normalization_is_idempotent(cells in prop::collection::vec(arb_cell(), 0..24)) {
            let classifier = KeywordClassifier::default();
            let mut once = Table::from_columns(vec![Column::new("Date paiement", cells)]);
            normalize_dates(&mut once, &classifier);
            let mut twice = once.clone();
            normalize_dates(&mut twice, &classifier);
            prop_assert_eq!(once, twice);
        }
    }
}
