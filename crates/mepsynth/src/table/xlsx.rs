//! XLSX workbook adapter.
//!
//! Import goes through calamine (xlsx, xls, xlsb and ods are accepted),
//! export through rust_xlsxwriter. Dates are written as serial numbers with
//! a date number format so they read back as dates.

use super::{CellValue, Sheet, Workbook, WorkbookReader, WorkbookWriter};
use crate::error::{Result, SynthError};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook};
use std::path::{Path, PathBuf};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Serial day 0 of the 1900 date system as used by spreadsheet software.
fn serial_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default()
}

/// Convert a spreadsheet serial date to a cell.
fn serial_to_cell(serial: f64) -> CellValue {
    if !serial.is_finite() || serial < 0.0 {
        return CellValue::Number(serial);
    }
    let days = serial.floor();
    let seconds = ((serial - days) * SECONDS_PER_DAY).round() as u32;
    let Some(date) = serial_epoch().checked_add_days(Days::new(days as u64)) else {
        return CellValue::Number(serial);
    };
    if seconds == 0 {
        return CellValue::Date(date);
    }
    if seconds >= 86_400 {
        return date
            .succ_opt()
            .map(CellValue::Date)
            .unwrap_or(CellValue::Number(serial));
    }
    match NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0) {
        Some(time) => CellValue::DateTime(date.and_time(time)),
        None => CellValue::Date(date),
    }
}

fn date_to_serial(date: NaiveDate) -> f64 {
    (date - serial_epoch()).num_days() as f64
}

fn datetime_to_serial(dt: NaiveDateTime) -> f64 {
    date_to_serial(dt.date()) + dt.time().num_seconds_from_midnight() as f64 / SECONDS_PER_DAY
}

fn data_to_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => serial_to_cell(dt.as_f64()),
        Data::DateTimeIso(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
            .map(CellValue::DateTime)
            .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d").map(CellValue::Date))
            .unwrap_or_else(|_| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(format!("#{:?}", e)),
    }
}

/// Reads every sheet of a spreadsheet file.
#[derive(Debug, Clone)]
pub struct XlsxReader {
    path: PathBuf,
}

impl XlsxReader {
    /// Reader for the file at `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl WorkbookReader for XlsxReader {
    fn read_workbook(&mut self) -> Result<Workbook> {
        let mut source = open_workbook_auto(&self.path).map_err(|e| {
            SynthError::workbook(format!("Failed to open '{}': {}", self.path.display(), e))
        })?;

        let mut workbook = Workbook::new();
        for name in source.sheet_names() {
            let range = source.worksheet_range(&name).map_err(|e| {
                SynthError::workbook(format!("Failed to read sheet '{}': {}", name, e))
            })?;

            // Ranges start at the first used cell; pad back to A1.
            let (row_offset, col_offset) = range
                .start()
                .map(|(r, c)| (r as usize, c as usize))
                .unwrap_or((0, 0));

            let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); row_offset];
            for row in range.rows() {
                let mut cells = vec![CellValue::Empty; col_offset];
                cells.extend(row.iter().map(data_to_cell));
                while matches!(cells.last(), Some(CellValue::Empty)) {
                    cells.pop();
                }
                rows.push(cells);
            }

            tracing::debug!(sheet = %name, rows = rows.len(), "sheet loaded");
            workbook.push(Sheet::new(name, rows));
        }
        Ok(workbook)
    }
}

/// Writes every sheet to an `.xlsx` file.
#[derive(Debug, Clone)]
pub struct XlsxWriter {
    path: PathBuf,
}

impl XlsxWriter {
    /// Writer for the file at `path`. Parent directories are created on write.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl WorkbookWriter for XlsxWriter {
    fn write_workbook(&mut self, workbook: &Workbook) -> Result<()> {
        let mut output = XlsxWorkbook::new();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let datetime_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

        for sheet in workbook.sheets() {
            let worksheet = output.add_worksheet();
            worksheet.set_name(&sheet.name).map_err(|e| {
                SynthError::workbook(format!("Failed to create sheet '{}': {}", sheet.name, e))
            })?;

            for (r, row) in sheet.rows.iter().enumerate() {
                let row32 = u32::try_from(r).map_err(|_| {
                    SynthError::workbook(format!("Sheet '{}' has too many rows", sheet.name))
                })?;
                for (c, cell) in row.iter().enumerate() {
                    let col16 = u16::try_from(c).map_err(|_| {
                        SynthError::workbook(format!("Sheet '{}' has too many columns", sheet.name))
                    })?;
                    let written = match cell {
                        CellValue::Empty => continue,
                        CellValue::Text(s) => worksheet.write_string(row32, col16, s),
                        CellValue::Number(n) => worksheet.write_number(row32, col16, *n),
                        CellValue::Bool(b) => worksheet.write_boolean(row32, col16, *b),
                        CellValue::Date(d) => worksheet.write_number_with_format(
                            row32,
                            col16,
                            date_to_serial(*d),
                            &date_format,
                        ),
                        CellValue::DateTime(dt) => worksheet.write_number_with_format(
                            row32,
                            col16,
                            datetime_to_serial(*dt),
                            &datetime_format,
                        ),
                    };
                    written.map_err(|e| {
                        SynthError::workbook(format!(
                            "Failed to write '{}' cell ({}, {}): {}",
                            sheet.name, r, c, e
                        ))
                    })?;
                }
            }
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        output.save(&self.path).map_err(|e| {
            SynthError::workbook(format!("Failed to save '{}': {}", self.path.display(), e))
        })?;
        tracing::debug!(path = %self.path.display(), sheets = workbook.sheets().len(), "workbook written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_serial_conversion() {
        let d = NaiveDate::from_ymd_opt(2026, 2, 4).unwrap();
        let serial = date_to_serial(d);
        assert_eq!(serial, 46057.0);
        assert_eq!(serial_to_cell(serial), CellValue::Date(d));

        let at = d.and_hms_opt(12, 0, 0).unwrap();
        assert_eq!(datetime_to_serial(at), 46057.5);
        assert_eq!(serial_to_cell(46057.5), CellValue::DateTime(at));
        assert_eq!(at.date().year(), 2026);
    }

    #[test]
    fn test_xlsx_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.xlsx");
        let d = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();

        let workbook = Workbook::new()
            .with_sheet(Sheet::new(
                "MEP",
                vec![
                    vec![CellValue::from("Numéro"), CellValue::from("Total à payer"), CellValue::from("Date")],
                    vec![CellValue::from("FA000002-0001"), CellValue::Number(1250.0), CellValue::Date(d)],
                ],
            ))
            .with_sheet(Sheet::new(
                "Notes",
                vec![vec![CellValue::Empty, CellValue::Bool(true)]],
            ));

        XlsxWriter::new(&path).write_workbook(&workbook).unwrap();
        let back = XlsxReader::new(&path).read_workbook().unwrap();

        assert_eq!(back.sheet_names(), vec!["MEP", "Notes"]);
        assert_eq!(back.sheet("MEP"), workbook.sheet("MEP"));
        assert_eq!(back.sheet("Notes"), workbook.sheet("Notes"));
    }
}
