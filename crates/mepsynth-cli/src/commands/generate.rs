//! `mepsynth generate` command - Rewrite the payment sheet with synthetic records.

use std::path::PathBuf;

use colored::Colorize;
use mepsynth::prelude::*;
use mepsynth::table::MemoryWriter;

use crate::error::{CliError, CliResult};

use super::{print_field, ConfigArgs};

/// Execute the `generate` command.
pub fn execute(
    args: &ConfigArgs,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    bonus_rate: Option<f64>,
    dry_run: bool,
) -> CliResult<()> {
    let mut config = args.resolve()?;
    if let Some(input) = input {
        config.input = input;
    }
    if let Some(output) = output {
        config.output = output;
    }
    if let Some(rate) = bonus_rate {
        config.bonus_rate = rate;
    }

    if !config.input.exists() {
        return Err(CliError::Config(format!(
            "Input workbook not found: {}",
            config.input.display()
        )));
    }

    println!("{} Synthesizing payment sheet", "→".bright_cyan());
    print_field("Input", config.input.display());
    print_field("Sheet", &config.sheet);
    print_field("Seed", config.seed);
    print_field("Reference date", config.today());
    println!();

    let assembler = DatasetAssembler::new(config.clone())?;
    let mut reader = XlsxReader::new(&config.input);
    let report = if dry_run {
        assembler.run(&mut reader, &mut MemoryWriter::default())?
    } else {
        assembler.run(&mut reader, &mut XlsxWriter::new(&config.output))?
    };

    print_report(&report);

    if !report.missing().is_empty() {
        return Err(CliError::Validation(format!(
            "anomaly classes missing from output: {:?}",
            report.missing()
        )));
    }

    println!();
    if dry_run {
        println!("{} Dry run, nothing written", "✓".bright_green().bold());
    } else {
        println!(
            "{} Anonymized workbook written to {}",
            "✓".bright_green().bold(),
            config.output.display().to_string().bright_white()
        );
    }
    Ok(())
}

fn print_report(report: &SynthReport) {
    println!("{}:", "Column mapping".bright_white().underline());
    for (field, column) in &report.roles {
        println!("  {:>18} -> {}", field.to_string(), column.bright_yellow());
    }
    println!("  {:>18} -> {:?}", "amount-like", report.amount_columns);
    println!("  {:>18} -> {:?}", "country-like", report.country_columns);
    for skipped in &report.skipped_amounts {
        println!(
            "  {} '{}' holds text, left untouched",
            "•".dimmed(),
            skipped.name
        );
    }
    println!();

    println!("{}:", "Guaranteed anomalies".bright_white().underline());
    for (row, class) in &report.forced {
        println!("  row {:>6} -> {}", row, class.to_string().bright_red());
    }
    println!();

    println!("{}:", "Anomalies per class".bright_white().underline());
    for (class, count) in &report.counts {
        let status = if *count > 0 {
            "✓".bright_green()
        } else {
            "✗".bright_red()
        };
        println!("    {} {:<22} {}", status, class.code(), count);
    }
    println!(
        "  {} records, {} forced, {} bonus",
        report.records.to_string().bright_white(),
        report.forced.len().to_string().bright_white(),
        report.bonus.len().to_string().bright_white()
    );

    if !report.warnings.is_empty() {
        println!();
        println!(
            "{} {} amount(s) written as text",
            "Warning:".yellow(),
            report.warnings.len()
        );
        for warning in report.warnings.iter().take(5) {
            println!("    {} {}", "⚠".yellow(), warning);
        }
    }
}
