//! Reviewer detection rules.
//!
//! One predicate per [`AnomalyClass`], applied either to a generated
//! [`Record`] or to the cells of an existing table. The synthesizer uses them
//! to check the guarantee; `audit_table` re-applies them to a workbook the
//! way the downstream macro would.

use crate::config::RuleConfig;
use crate::table::{CellValue, Table, TableLayout};
use crate::types::{AnomalyClass, Record};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// The reviewer's predicates, bound to a reference date.
#[derive(Debug, Clone)]
pub struct ReviewRules {
    config: RuleConfig,
    today: NaiveDate,
}

impl ReviewRules {
    /// Bind rule constants to the run's reference date.
    pub fn new(config: &RuleConfig, today: NaiveDate) -> Self {
        Self {
            config: config.clone(),
            today,
        }
    }

    /// Reference date used by the date rule.
    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Whether `cell`, read as the target field of `class`, violates it.
    pub fn flags(&self, class: AnomalyClass, cell: &CellValue) -> bool {
        let rules = &self.config;
        match class {
            AnomalyClass::VerifyRib => cell.to_display_string().trim() == rules.sentinel_beneficiary,
            AnomalyClass::InvoiceInvalid => {
                let text = cell.to_display_string();
                let token = rules.invoice_token.as_str();
                match text.chars().next() {
                    None => true,
                    Some(first) => {
                        text.trim().is_empty()
                            || text.starts_with(token)
                            || text.ends_with(token)
                            || !first.is_alphanumeric()
                    }
                }
            }
            AnomalyClass::AmountHigh => cell
                .as_number()
                .map(|n| n >= rules.amount_threshold as f64)
                .unwrap_or(false),
            AnomalyClass::DatePast => cell.as_date().map(|d| d < self.today).unwrap_or(false),
            AnomalyClass::IbanFlagged => {
                let iban = cell.to_display_string();
                rules
                    .iban_flagged_suffixes
                    .iter()
                    .any(|s| iban.ends_with(s.as_str()))
            }
            AnomalyClass::BicBlockedPrimary => {
                let bic = cell.to_display_string();
                bic.trim().is_empty()
                    || rules
                        .bic_primary_prefixes
                        .iter()
                        .any(|p| bic.starts_with(p.as_str()))
            }
            AnomalyClass::BicBlockedSecondary => {
                let bic = cell.to_display_string();
                rules
                    .bic_secondary_prefixes
                    .iter()
                    .any(|p| bic.starts_with(p.as_str()))
            }
            AnomalyClass::CountryInvalid => {
                let code = cell.to_display_string();
                !rules.allowed_countries.iter().any(|c| c == code.trim())
            }
        }
    }

    /// Every class `record` violates, in catalog order.
    pub fn violations(&self, record: &Record) -> Vec<AnomalyClass> {
        AnomalyClass::ALL
            .into_iter()
            .filter(|class| self.flags(*class, &record.cell(class.target())))
            .collect()
    }

    /// Whether `record` passes every rule.
    pub fn is_compliant(&self, record: &Record) -> bool {
        self.violations(record).is_empty()
    }
}

/// Result of re-applying the rules to a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    /// Records audited.
    pub records: usize,
    /// Records flagged per class; every class is present, possibly at zero.
    pub counts: BTreeMap<AnomalyClass, usize>,
    /// Flagged classes per record index, for flagged records only.
    pub flagged: BTreeMap<usize, Vec<AnomalyClass>>,
}

impl AuditReport {
    /// Classes no record violates.
    pub fn missing(&self) -> Vec<AnomalyClass> {
        AnomalyClass::ALL
            .into_iter()
            .filter(|c| self.counts.get(c).copied().unwrap_or(0) == 0)
            .collect()
    }

    /// Whether every class is present at least once.
    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    /// Records violating at least one rule.
    pub fn flagged_records(&self) -> usize {
        self.flagged.len()
    }
}

/// Apply every rule to every record of `table`.
pub fn audit_table(table: &Table, layout: &TableLayout, rules: &ReviewRules) -> AuditReport {
    let mut counts: BTreeMap<AnomalyClass, usize> =
        AnomalyClass::ALL.into_iter().map(|c| (c, 0)).collect();
    let mut flagged = BTreeMap::new();
    let empty = CellValue::Empty;

    for row in 0..table.len() {
        let hits: Vec<AnomalyClass> = AnomalyClass::ALL
            .into_iter()
            .filter(|class| {
                let cell = table
                    .cell(row, layout.column(class.target()))
                    .unwrap_or(&empty);
                rules.flags(*class, cell)
            })
            .collect();
        for class in &hits {
            *counts.entry(*class).or_insert(0) += 1;
        }
        if !hits.is_empty() {
            flagged.insert(row, hits);
        }
    }

    tracing::debug!(
        records = table.len(),
        flagged = flagged.len(),
        "audit complete"
    );

    AuditReport {
        records: table.len(),
        counts,
        flagged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DetectionConfig, RoleMapping};
    use crate::table::{Column, KeywordClassifier};
    use crate::types::Field;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 4).unwrap()
    }

    fn rules() -> ReviewRules {
        ReviewRules::new(&RuleConfig::default(), today())
    }

    fn compliant() -> Record {
        Record {
            beneficiary: "LA POSTE".to_string(),
            invoice_number: "FA000002-4821".to_string(),
            amount: 1250.0,
            account_end_date: today(),
            iban: "FR7612345678901234567890123".to_string(),
            bic: "ABCDFRPPXYZ".to_string(),
            bank_country: "FR".to_string(),
        }
    }

    #[test]
    fn test_compliant_record_passes() {
        assert!(rules().is_compliant(&compliant()));
    }

    #[test]
    fn test_amount_threshold_boundary() {
        let rules = rules();
        assert!(rules.flags(AnomalyClass::AmountHigh, &CellValue::Number(800_000.0)));
        assert!(!rules.flags(AnomalyClass::AmountHigh, &CellValue::Number(799_999.0)));
        assert!(rules.flags(AnomalyClass::AmountHigh, &CellValue::from("900000")));
        assert!(!rules.flags(AnomalyClass::AmountHigh, &CellValue::Empty));
    }

    #[test]
    fn test_invoice_rules() {
        let rules = rules();
        let flag = |s: &str| rules.flags(AnomalyClass::InvoiceInvalid, &CellValue::from(s));
        assert!(flag(""));
        assert!(flag("TITAB12CD34E"));
        assert!(flag("AB12CD34ETIT"));
        assert!(flag("_AB12CD34EF"));
        assert!(!flag("FA000002-4821"));
        assert!(rules.flags(AnomalyClass::InvoiceInvalid, &CellValue::Empty));
    }

    #[test]
    fn test_date_is_past_only_strictly_before_today() {
        let rules = rules();
        let yesterday = today().pred_opt().unwrap();
        assert!(rules.flags(AnomalyClass::DatePast, &CellValue::Date(yesterday)));
        assert!(!rules.flags(AnomalyClass::DatePast, &CellValue::Date(today())));
    }

    #[test]
    fn test_bic_rules_are_prefix_based() {
        let rules = rules();
        assert!(rules.flags(AnomalyClass::BicBlockedPrimary, &CellValue::from("")));
        assert!(rules.flags(AnomalyClass::BicBlockedPrimary, &CellValue::from("BDFEFRPPXXX")));
        assert!(!rules.flags(AnomalyClass::BicBlockedPrimary, &CellValue::from("NORDFRPPXXX")));
        assert!(rules.flags(AnomalyClass::BicBlockedSecondary, &CellValue::from("SBGDFRPA1B2")));
        assert!(!rules.flags(AnomalyClass::BicBlockedSecondary, &CellValue::from("")));
    }

    #[test]
    fn test_violations_report_each_class() {
        let rules = rules();
        let mut record = compliant();
        record.iban = "FR761234567890123456789".to_string() + "1623";
        record.bank_country = "DE".to_string();
        assert_eq!(
            rules.violations(&record),
            vec![AnomalyClass::IbanFlagged, AnomalyClass::CountryInvalid]
        );

        let mut record = compliant();
        record.beneficiary = "AKAMAI".to_string();
        assert_eq!(rules.violations(&record), vec![AnomalyClass::VerifyRib]);
    }

    #[test]
    fn test_audit_table_counts_and_missing() {
        let mapping = RoleMapping::default();
        let mut high = compliant();
        high.amount = 800_000.0;
        let records = [compliant(), high];

        let columns = Field::ALL
            .iter()
            .map(|f| {
                Column::new(
                    mapping.column(*f),
                    records.iter().map(|r| r.cell(*f)).collect(),
                )
            })
            .collect();
        let table = Table::from_columns(columns);
        let layout = TableLayout::resolve(
            &table,
            &mapping,
            &KeywordClassifier::default(),
            &DetectionConfig::default(),
        )
        .unwrap();

        let report = audit_table(&table, &layout, &rules());
        assert_eq!(report.records, 2);
        assert_eq!(report.counts[&AnomalyClass::AmountHigh], 1);
        assert_eq!(report.flagged_records(), 1);
        assert_eq!(report.flagged[&1], vec![AnomalyClass::AmountHigh]);
        assert_eq!(report.missing().len(), AnomalyClass::COUNT - 1);
        assert!(!report.is_complete());
    }
}
