//! `mepsynth check` command - Re-apply the reviewer rules to a workbook.

use std::path::Path;

use colored::Colorize;
use mepsynth::prelude::*;

use crate::error::{CliError, CliResult};

use super::{print_field, ConfigArgs};

/// Execute the `check` command.
pub fn execute(file: Option<&Path>, args: &ConfigArgs, detailed: bool) -> CliResult<()> {
    let config = args.resolve()?;
    let path = file.unwrap_or(config.output.as_path());

    if !path.exists() {
        return Err(CliError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Workbook not found: {}", path.display()),
        )));
    }

    println!("{} Auditing workbook", "→".bright_cyan());
    print_field("File", path.display());
    print_field("Sheet", &config.sheet);
    print_field("Reference date", config.today());
    println!();

    let workbook = XlsxReader::new(path).read_workbook()?;
    let report = audit_workbook(&workbook, &config)?;

    println!("{}:", "Audit Report".bright_white().underline());
    println!();
    for (class, count) in &report.counts {
        let status = if *count > 0 {
            "✓".bright_green()
        } else {
            "✗".bright_red()
        };
        println!(
            "    {} {:<22} {:>6}  {}",
            status,
            class.code(),
            count,
            class.description().dimmed()
        );
    }
    println!();
    println!(
        "  {} of {} record(s) flagged",
        report.flagged_records().to_string().bright_white(),
        report.records.to_string().bright_white()
    );

    if detailed && !report.flagged.is_empty() {
        println!();
        println!("{}:", "Flagged records".bright_white().underline());
        for (row, classes) in &report.flagged {
            let codes: Vec<&str> = classes.iter().map(|c| c.code()).collect();
            println!("    row {:>6}  {}", row, codes.join(", ").yellow());
        }
    }

    let missing = report.missing();
    if !missing.is_empty() {
        let codes: Vec<&str> = missing.iter().map(|c| c.code()).collect();
        return Err(CliError::Validation(format!(
            "no record violates {}",
            codes.join(", ")
        )));
    }

    println!();
    println!("{} Every anomaly class is present", "✓".bright_green().bold());
    Ok(())
}

/// Resolve the target sheet of `workbook` and audit it.
pub fn audit_workbook(workbook: &Workbook, config: &SynthConfig) -> CliResult<AuditReport> {
    let table = workbook.load_table(&config.sheet, config.header_row)?;
    let layout = TableLayout::resolve(
        &table,
        &config.columns,
        &KeywordClassifier::new(&config.detection),
        &config.detection,
    )?;
    let rules = ReviewRules::new(&config.rules, config.today());
    Ok(audit_table(&table, &layout, &rules))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_generated_workbook_is_complete() {
        let config = SynthConfig {
            reference_date: chrono::NaiveDate::from_ymd_opt(2026, 2, 4),
            ..SynthConfig::default()
        };

        let mut header: Vec<CellValue> = Field::ALL
            .iter()
            .map(|f| CellValue::from(config.columns.column(*f)))
            .collect();
        header.push(CellValue::from("Notes"));
        let mut rows = vec![header];
        rows.extend((0..16).map(|_| vec![CellValue::Empty; Field::ALL.len() + 1]));
        let input = Workbook::new().with_sheet(Sheet::new("MEP", rows));

        let (output, _) = DatasetAssembler::new(config.clone())
            .unwrap()
            .synthesize(&input)
            .unwrap();

        let report = audit_workbook(&output, &config).unwrap();
        assert!(report.is_complete());
        assert_eq!(report.records, 16);

        let untouched = audit_workbook(&input, &config).unwrap();
        assert!(!untouched.is_complete());
    }
}
