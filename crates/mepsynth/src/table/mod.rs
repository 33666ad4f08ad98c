//! In-memory tabular model shared by the synthesizer and the workbook
//! adapters.
//!
//! A [`Workbook`] is an ordered list of raw [`Sheet`]s. The target sheet is
//! parsed into a [`Table`] of typed [`Column`]s at a header-row offset,
//! rewritten, and turned back into a sheet; every other sheet is carried
//! through untouched.

mod detect;
mod layout;
mod normalize;
#[cfg(feature = "xlsx")]
mod xlsx;

pub use detect::{normalize_name, ColumnClassifier, KeywordClassifier};
pub use layout::{SkippedColumn, TableLayout};
pub use normalize::{normalize_dates, parse_date_text};
#[cfg(feature = "xlsx")]
pub use xlsx::{XlsxReader, XlsxWriter};

use crate::error::{Result, SynthError};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Blank cell.
    #[default]
    Empty,
    /// Text cell.
    Text(String),
    /// Numeric cell.
    Number(f64),
    /// Boolean cell.
    Bool(bool),
    /// Calendar date without time of day.
    Date(NaiveDate),
    /// Date with time of day.
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Whether the cell is blank.
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Text content, if this is a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric interpretation: numbers as-is, text parsed after trimming.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => parse_number_text(s),
            _ => None,
        }
    }

    /// Calendar-date interpretation.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(d) => Some(*d),
            CellValue::DateTime(dt) => Some(dt.date()),
            CellValue::Text(s) => parse_date_text(s),
            _ => None,
        }
    }

    /// Display form, as a spreadsheet would show it in a text column.
    pub fn to_display_string(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            CellValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    fn kind(&self) -> ColumnKind {
        match self {
            CellValue::Empty => ColumnKind::Empty,
            CellValue::Text(_) => ColumnKind::Text,
            CellValue::Number(_) => ColumnKind::Number,
            CellValue::Date(_) | CellValue::DateTime(_) => ColumnKind::Date,
            CellValue::Bool(_) => ColumnKind::Mixed,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::DateTime(dt)
    }
}

/// Integers without decimals, everything else in shortest form.
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn parse_number_text(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Storage type of a column, inferred from its cells like a dataframe dtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnKind {
    /// No non-empty cell.
    #[default]
    Empty,
    /// Only text cells.
    Text,
    /// Only numeric cells.
    Number,
    /// Only date or date-time cells.
    Date,
    /// Anything else.
    Mixed,
}

impl ColumnKind {
    /// Infer the kind of a column from its cells.
    pub fn infer<'a>(cells: impl IntoIterator<Item = &'a CellValue>) -> Self {
        cells
            .into_iter()
            .fold(ColumnKind::Empty, |kind, cell| kind.merge(cell.kind()))
    }

    fn merge(self, other: ColumnKind) -> ColumnKind {
        match (self, other) {
            (ColumnKind::Empty, k) | (k, ColumnKind::Empty) => k,
            (a, b) if a == b => a,
            _ => ColumnKind::Mixed,
        }
    }
}

/// A named, typed column of a [`Table`].
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    kind: ColumnKind,
    cells: Vec<CellValue>,
}

impl Column {
    /// Create a column, inferring its kind.
    pub fn new(name: impl Into<String>, cells: Vec<CellValue>) -> Self {
        let kind = ColumnKind::infer(&cells);
        Self {
            name: name.into(),
            kind,
            cells,
        }
    }

    /// Column name as resolved from the header row.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current storage kind.
    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    /// All cells, top to bottom.
    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }

    /// Cell at `row`.
    pub fn get(&self, row: usize) -> Option<&CellValue> {
        self.cells.get(row)
    }

    /// Overwrite the cell at `row`. Out-of-range rows are ignored.
    pub fn set(&mut self, row: usize, value: CellValue) {
        if let Some(cell) = self.cells.get_mut(row) {
            self.kind = self.kind.merge(value.kind());
            *cell = value;
        }
    }

    /// Convert every non-empty cell to its display text.
    pub fn cast_text(&mut self) {
        for cell in &mut self.cells {
            if !cell.is_empty() && !matches!(cell, CellValue::Text(_)) {
                *cell = CellValue::Text(cell.to_display_string());
            }
        }
        self.kind = ColumnKind::infer(&self.cells);
    }

    /// Convert the column to numbers, clearing values that do not parse.
    ///
    /// Every storage kind is coerced the same way. Returns the number of
    /// cleared cells.
    pub fn coerce_numeric(&mut self) -> usize {
        if matches!(self.kind, ColumnKind::Empty | ColumnKind::Number) {
            return 0;
        }

        let mut cleared = 0;
        for (row, cell) in self.cells.iter_mut().enumerate() {
            *cell = match cell.as_number() {
                Some(n) => CellValue::Number(n),
                None if cell.is_empty() => CellValue::Empty,
                None => {
                    tracing::debug!(
                        column = %self.name,
                        row,
                        value = %cell.to_display_string(),
                        "non-numeric value cleared"
                    );
                    cleared += 1;
                    CellValue::Empty
                }
            };
        }
        self.kind = ColumnKind::infer(&self.cells);
        cleared
    }

    /// Whether the column holds text rather than numbers.
    ///
    /// Text-typed columns always do. Mixed columns do when more than
    /// `alpha_ratio` of the first `sample_size` non-empty cells contain an
    /// ASCII letter.
    pub fn looks_textual(&self, sample_size: usize, alpha_ratio: f64) -> bool {
        match self.kind {
            ColumnKind::Text => true,
            ColumnKind::Mixed => {
                let sample: Vec<String> = self
                    .cells
                    .iter()
                    .filter(|c| !c.is_empty())
                    .take(sample_size)
                    .map(CellValue::to_display_string)
                    .collect();
                if sample.is_empty() {
                    return false;
                }
                let alphabetic = sample
                    .iter()
                    .filter(|s| s.bytes().any(|b| b.is_ascii_alphabetic()))
                    .count();
                alphabetic as f64 / sample.len() as f64 > alpha_ratio
            }
            ColumnKind::Empty | ColumnKind::Number | ColumnKind::Date => false,
        }
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [CellValue] {
        &mut self.cells
    }

    pub(crate) fn refresh_kind(&mut self) {
        self.kind = ColumnKind::infer(&self.cells);
    }
}

/// A raw sheet: a name and a grid of cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    /// Sheet name.
    pub name: String,
    /// Rows of cells; rows may have different lengths.
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    /// Create a sheet from rows.
    pub fn new(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }
}

/// An ordered collection of sheets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    /// Create an empty workbook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sheet (builder style).
    pub fn with_sheet(mut self, sheet: Sheet) -> Self {
        self.sheets.push(sheet);
        self
    }

    /// Append a sheet.
    pub fn push(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    /// All sheets in order.
    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    /// Sheet names in order.
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    /// Sheet by name.
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Replace the sheet with the same name, keeping its position.
    ///
    /// Returns `false` (and leaves the workbook unchanged) when no sheet has
    /// that name.
    pub fn replace_sheet(&mut self, sheet: Sheet) -> bool {
        match self.sheets.iter_mut().find(|s| s.name == sheet.name) {
            Some(slot) => {
                *slot = sheet;
                true
            }
            None => false,
        }
    }

    /// Parse the named sheet into a table.
    pub fn load_table(&self, name: &str, header_row: usize) -> Result<Table> {
        let sheet = self.sheet(name).ok_or_else(|| SynthError::SheetNotFound {
            sheet: name.to_string(),
            available: self.sheet_names(),
        })?;
        Table::from_sheet(sheet, header_row)
    }
}

/// A sheet parsed at a header row into named typed columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    preamble: Vec<Vec<CellValue>>,
    header: Vec<CellValue>,
    columns: Vec<Column>,
    len: usize,
}

impl Table {
    /// Build a table from named columns of equal length.
    pub fn from_columns(columns: Vec<Column>) -> Self {
        let len = columns.iter().map(|c| c.cells.len()).max().unwrap_or(0);
        let mut columns = columns;
        for column in &mut columns {
            column.cells.resize(len, CellValue::Empty);
        }
        let header = columns
            .iter()
            .map(|c| CellValue::Text(c.name.clone()))
            .collect();
        Self {
            preamble: Vec::new(),
            header,
            columns,
            len,
        }
    }

    /// Parse `sheet` using row `header_row` as column names.
    ///
    /// Rows above the header are kept as a preamble. Blank header cells are
    /// named `Unnamed: <i>`, repeated names get a `.<n>` suffix.
    pub fn from_sheet(sheet: &Sheet, header_row: usize) -> Result<Self> {
        if header_row >= sheet.rows.len() {
            return Err(SynthError::InvalidHeaderRow {
                sheet: sheet.name.clone(),
                header_row,
                rows: sheet.rows.len(),
            });
        }

        let header = sheet.rows[header_row].clone();
        let data = &sheet.rows[header_row + 1..];
        let width = data
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(header.len()))
            .max()
            .unwrap_or(0);

        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut columns = Vec::with_capacity(width);
        for col in 0..width {
            let raw = header
                .get(col)
                .map(CellValue::to_display_string)
                .unwrap_or_default();
            let base = if raw.trim().is_empty() {
                format!("Unnamed: {}", col)
            } else {
                raw
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{}.{}", base, count)
            };
            *count += 1;

            let cells = data
                .iter()
                .map(|row| row.get(col).cloned().unwrap_or_default())
                .collect();
            columns.push(Column::new(name, cells));
        }

        Ok(Self {
            preamble: sheet.rows[..header_row].to_vec(),
            header,
            columns,
            len: data.len(),
        })
    }

    /// Render the table back into a sheet named `name`.
    pub fn to_sheet(&self, name: impl Into<String>) -> Sheet {
        let mut rows = self.preamble.clone();
        rows.push(self.header.clone());
        for row in 0..self.len {
            rows.push(
                self.columns
                    .iter()
                    .map(|c| c.cells[row].clone())
                    .collect(),
            );
        }
        Sheet::new(name, rows)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the table has no records.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Rows above the header.
    pub fn preamble(&self) -> &[Vec<CellValue>] {
        &self.preamble
    }

    /// Column names in position order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Position of the column with exactly this name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// All columns.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column at `index`.
    pub fn column(&self, index: usize) -> &Column {
        &self.columns[index]
    }

    /// Mutable column at `index`.
    pub fn column_mut(&mut self, index: usize) -> &mut Column {
        &mut self.columns[index]
    }

    /// Cell at (`row`, `col`).
    pub fn cell(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.columns.get(col).and_then(|c| c.get(row))
    }

    /// Overwrite the cell at (`row`, `col`).
    pub fn set(&mut self, row: usize, col: usize, value: CellValue) {
        if let Some(column) = self.columns.get_mut(col) {
            column.set(row, value);
        }
    }
}

/// Source of a workbook.
pub trait WorkbookReader {
    /// Load every sheet.
    fn read_workbook(&mut self) -> Result<Workbook>;
}

/// Destination of a workbook.
pub trait WorkbookWriter {
    /// Persist every sheet, in order.
    fn write_workbook(&mut self, workbook: &Workbook) -> Result<()>;
}

impl WorkbookReader for Workbook {
    fn read_workbook(&mut self) -> Result<Workbook> {
        Ok(self.clone())
    }
}

/// Writer that keeps the last written workbook in memory.
#[derive(Debug, Default)]
pub struct MemoryWriter {
    /// Last workbook written.
    pub written: Option<Workbook>,
}

impl WorkbookWriter for MemoryWriter {
    fn write_workbook(&mut self, workbook: &Workbook) -> Result<()> {
        self.written = Some(workbook.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::from(s)
    }

    #[test]
    fn test_kind_inference() {
        assert_eq!(ColumnKind::infer(&Vec::new()), ColumnKind::Empty);
        assert_eq!(
            ColumnKind::infer(&[CellValue::Number(1.0), CellValue::Empty]),
            ColumnKind::Number
        );
        assert_eq!(ColumnKind::infer(&[text("a"), text("b")]), ColumnKind::Text);
        assert_eq!(
            ColumnKind::infer(&[text("a"), CellValue::Number(2.0)]),
            ColumnKind::Mixed
        );
    }

    #[test]
    fn test_from_sheet_with_preamble_and_duplicate_headers() {
        let sheet = Sheet::new(
            "MEP",
            vec![
                vec![text("Export du 04/02")],
                vec![text("Montant"), CellValue::Empty, text("Montant")],
                vec![CellValue::Number(1.0), text("x")],
                vec![CellValue::Number(2.0), text("y"), CellValue::Number(3.0)],
            ],
        );
        let table = Table::from_sheet(&sheet, 1).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(
            table.column_names(),
            vec!["Montant", "Unnamed: 1", "Montant.1"]
        );
        assert_eq!(table.preamble().len(), 1);
        assert_eq!(table.cell(0, 2), Some(&CellValue::Empty));

        let back = table.to_sheet("MEP");
        assert_eq!(back.rows[0], sheet.rows[0]);
        assert_eq!(back.rows[1], sheet.rows[1]);
        assert_eq!(back.rows[3], sheet.rows[3]);
    }

    #[test]
    fn test_header_row_out_of_range() {
        let sheet = Sheet::new("MEP", vec![vec![text("A")]]);
        let err = Table::from_sheet(&sheet, 3).unwrap_err();
        assert!(matches!(err, SynthError::InvalidHeaderRow { rows: 1, .. }));
    }

    #[test]
    fn test_missing_sheet_lists_available() {
        let wb = Workbook::new().with_sheet(Sheet::new("Notes", vec![]));
        match wb.load_table("MEP", 0) {
            Err(SynthError::SheetNotFound { available, .. }) => {
                assert_eq!(available, vec!["Notes".to_string()])
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_coerce_numeric_text_column() {
        let mut numeric_text = Column::new("Total", vec![text("12"), text(" 3.5 ")]);
        assert_eq!(numeric_text.coerce_numeric(), 0);
        assert_eq!(numeric_text.kind(), ColumnKind::Number);
        assert_eq!(numeric_text.get(1), Some(&CellValue::Number(3.5)));

        let mut prose = Column::new("Total", vec![text("12"), text("douze"), CellValue::Empty]);
        assert_eq!(prose.coerce_numeric(), 1);
        assert_eq!(prose.kind(), ColumnKind::Number);
        assert_eq!(prose.get(0), Some(&CellValue::Number(12.0)));
        assert_eq!(prose.get(1), Some(&CellValue::Empty));
    }

    #[test]
    fn test_coerce_numeric_ignores_storage_kind() {
        let mut as_text = vec![text("12"); 10];
        as_text[4] = text("à voir");
        let mut as_mixed = vec![CellValue::Number(12.0); 10];
        as_mixed[4] = text("à voir");

        let mut text_col = Column::new("Total", as_text);
        let mut mixed_col = Column::new("Total", as_mixed);
        assert_eq!(text_col.kind(), ColumnKind::Text);
        assert_eq!(mixed_col.kind(), ColumnKind::Mixed);

        assert_eq!(text_col.coerce_numeric(), 1);
        assert_eq!(mixed_col.coerce_numeric(), 1);
        assert_eq!(text_col.cells(), mixed_col.cells());
        assert_eq!(text_col.kind(), ColumnKind::Number);
    }

    #[test]
    fn test_looks_textual_samples_mixed_columns() {
        let mostly_numbers = Column::new(
            "Montant",
            vec![
                CellValue::Number(1.0),
                CellValue::Number(2.0),
                CellValue::Number(3.0),
                CellValue::Number(4.0),
                CellValue::Number(5.0),
                text("abc"),
            ],
        );
        assert!(!mostly_numbers.looks_textual(20, 0.2));

        let comments = Column::new("Montant", vec![CellValue::Number(1.0), text("voir RIB")]);
        assert!(comments.looks_textual(20, 0.2));

        let text_only = Column::new("Montant", vec![text("1")]);
        assert!(text_only.looks_textual(20, 0.2));
    }

    #[test]
    fn test_cast_text() {
        let mut column = Column::new(
            "IBAN",
            vec![CellValue::Number(76.0), CellValue::Empty, text("FR76")],
        );
        column.cast_text();
        assert_eq!(column.kind(), ColumnKind::Text);
        assert_eq!(column.get(0), Some(&text("76")));
        assert_eq!(column.get(1), Some(&CellValue::Empty));
    }

    #[test]
    fn test_replace_sheet_keeps_position() {
        let mut wb = Workbook::new()
            .with_sheet(Sheet::new("A", vec![]))
            .with_sheet(Sheet::new("MEP", vec![]))
            .with_sheet(Sheet::new("B", vec![]));
        assert!(wb.replace_sheet(Sheet::new("MEP", vec![vec![text("x")]])));
        assert_eq!(wb.sheet_names(), vec!["A", "MEP", "B"]);
        assert_eq!(wb.sheets()[1].rows.len(), 1);
        assert!(!wb.replace_sheet(Sheet::new("C", vec![])));
    }

    #[test]
    fn test_display_numbers() {
        assert_eq!(CellValue::Number(800000.0).to_display_string(), "800000");
        assert_eq!(CellValue::Number(12.5).to_display_string(), "12.5");
    }
}
