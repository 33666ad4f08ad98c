//! Whole-workbook synthesis run.

use super::{AnomalyScheduler, FieldGenerators, Outcome, RecordSynthesizer, SynthReport};
use crate::config::SynthConfig;
use crate::error::{Result, SynthError};
use crate::rules::ReviewRules;
use crate::table::{
    normalize_dates, ColumnClassifier, KeywordClassifier, Table, TableLayout, Workbook,
    WorkbookReader, WorkbookWriter,
};
use crate::types::{AnomalyClass, Field};
use rand::prelude::*;
use rand::rngs::StdRng;
use std::collections::BTreeMap;

/// Drives a synthesis run over the target sheet of a workbook.
///
/// ```no_run
/// use mepsynth::prelude::*;
///
/// let config = SynthConfig::load("mepsynth.toml")?;
/// let assembler = DatasetAssembler::new(config.clone())?;
/// let report = assembler.run(
///     &mut XlsxReader::new(&config.input),
///     &mut XlsxWriter::new(&config.output),
/// )?;
/// assert!(report.missing().is_empty());
/// # Ok::<(), mepsynth::SynthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct DatasetAssembler<C = KeywordClassifier> {
    config: SynthConfig,
    classifier: C,
}

impl DatasetAssembler<KeywordClassifier> {
    /// Assembler using keyword column detection from the configuration.
    pub fn new(config: SynthConfig) -> Result<Self> {
        let classifier = KeywordClassifier::new(&config.detection);
        Self::with_classifier(config, classifier)
    }
}

impl<C: ColumnClassifier> DatasetAssembler<C> {
    /// Assembler using a custom column classifier.
    pub fn with_classifier(config: SynthConfig, classifier: C) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, classifier })
    }

    /// Run configuration.
    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    /// Read, synthesize and write.
    ///
    /// Nothing is written when synthesis fails.
    pub fn run(
        &self,
        reader: &mut impl WorkbookReader,
        writer: &mut impl WorkbookWriter,
    ) -> Result<SynthReport> {
        let input = reader.read_workbook()?;
        let (output, report) = self.synthesize(&input)?;
        writer.write_workbook(&output)?;
        tracing::info!(
            sheet = %report.sheet,
            records = report.records,
            anomalies = report.anomalies(),
            "workbook written"
        );
        Ok(report)
    }

    /// Produce the output workbook: the target sheet replaced by synthesized
    /// records, every other sheet unchanged.
    pub fn synthesize(&self, workbook: &Workbook) -> Result<(Workbook, SynthReport)> {
        let config = &self.config;
        let today = config.today();

        let mut table = workbook.load_table(&config.sheet, config.header_row)?;
        let layout = TableLayout::resolve(&table, &config.columns, &self.classifier, &config.detection)?;
        let names = table.column_names();
        log_layout(&table, &layout);

        let mut rng = StdRng::seed_from_u64(config.seed);
        let scheduler = AnomalyScheduler::plan(table.len(), config.bonus_rate, &mut rng)?;
        for (row, class) in scheduler.forced() {
            tracing::info!(row, class = %class, "forced anomaly");
        }

        let rules = ReviewRules::new(&config.rules, today);
        let synthesizer =
            RecordSynthesizer::new(FieldGenerators::from_config(config), layout.clone(), config.header_row);
        synthesizer.prepare(&mut table);

        let mut bonus = BTreeMap::new();
        let mut counts: BTreeMap<AnomalyClass, usize> =
            AnomalyClass::ALL.into_iter().map(|c| (c, 0)).collect();
        let mut warnings = Vec::new();

        for index in 0..table.len() {
            let (record, outcome) = synthesizer.synthesize(index, &scheduler, &mut rng);
            tracing::debug!(row = index, outcome = %outcome, "record synthesized");
            if let Outcome::Bonus(class) = outcome {
                bonus.insert(index, class);
            }
            for class in rules.violations(&record) {
                *counts.entry(class).or_insert(0) += 1;
            }
            warnings.extend(synthesizer.write(&mut table, index, &record, &mut rng));
        }

        if !warnings.is_empty() {
            tracing::warn!(
                count = warnings.len(),
                column = config.columns.column(Field::Amount),
                "non-finite amounts written as text"
            );
        }

        let normalized = normalize_dates(&mut table, &self.classifier);
        tracing::debug!(columns = normalized, "date columns normalized");

        let mut output = workbook.clone();
        if !output.replace_sheet(table.to_sheet(config.sheet.as_str())) {
            return Err(SynthError::SheetNotFound {
                sheet: config.sheet.clone(),
                available: workbook.sheet_names(),
            });
        }

        let report = SynthReport {
            sheet: config.sheet.clone(),
            records: table.len(),
            reference_date: today,
            roles: Field::ALL
                .into_iter()
                .map(|f| (f, names[layout.column(f)].clone()))
                .collect(),
            amount_columns: layout.amount_columns().iter().map(|&i| names[i].clone()).collect(),
            country_columns: layout.country_columns().iter().map(|&i| names[i].clone()).collect(),
            skipped_amounts: layout.skipped_amounts().to_vec(),
            forced: scheduler.forced().clone(),
            bonus,
            counts,
            warnings,
        };

        let missing = report.missing();
        if !missing.is_empty() {
            tracing::warn!(missing = ?missing, "anomaly classes missing from output");
        }
        Ok((output, report))
    }
}

fn log_layout(table: &Table, layout: &TableLayout) {
    let names = table.column_names();
    for field in Field::ALL {
        tracing::info!(role = %field, column = %names[layout.column(field)], "role mapped");
    }
    let pick = |indices: &[usize]| -> Vec<&str> { indices.iter().map(|&i| names[i].as_str()).collect() };
    tracing::info!(columns = ?pick(layout.amount_columns()), "amount-like columns");
    tracing::info!(columns = ?pick(layout.country_columns()), "country-like columns");
}
