//! Compliant and violating value generators, one pair per field.

use crate::config::{GenerationConfig, RuleConfig, SynthConfig, BIC_LENGTH, IBAN_DIGITS};
use crate::types::{AnomalyClass, Record};
use chrono::{Days, NaiveDate};
use rand::prelude::*;

const DIGITS: &[u8] = b"0123456789";
const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const ALNUM: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

fn random_from(alphabet: &[u8], len: usize, rng: &mut impl Rng) -> String {
    (0..len)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect()
}

fn digits(len: usize, rng: &mut impl Rng) -> String {
    random_from(DIGITS, len, rng)
}

fn upper(len: usize, rng: &mut impl Rng) -> String {
    random_from(UPPER, len, rng)
}

fn alnum(len: usize, rng: &mut impl Rng) -> String {
    random_from(ALNUM, len, rng)
}

fn pick<'a>(items: &'a [String], rng: &mut impl Rng) -> &'a str {
    items.choose(rng).map(String::as_str).unwrap_or_default()
}

/// Ways an invoice number can be invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceDefect {
    /// Empty string.
    Empty,
    /// Reserved token followed by 9 alphanumerics.
    ReservedPrefix,
    /// 9 alphanumerics followed by the reserved token.
    ReservedSuffix,
    /// Underscore followed by 10 alphanumerics.
    LeadingSymbol,
}

impl InvoiceDefect {
    /// Every defect, drawn uniformly.
    pub const ALL: [InvoiceDefect; 4] = [
        InvoiceDefect::Empty,
        InvoiceDefect::ReservedPrefix,
        InvoiceDefect::ReservedSuffix,
        InvoiceDefect::LeadingSymbol,
    ];
}

/// Field value generators bound to one run's rules, catalogs and
/// reference date.
///
/// Compliant generators never produce a value any reviewer rule flags;
/// [`FieldGenerators::violate`] produces a value flagged by exactly the
/// requested class.
#[derive(Debug, Clone)]
pub struct FieldGenerators {
    rules: RuleConfig,
    generation: GenerationConfig,
    today: NaiveDate,
}

impl FieldGenerators {
    /// Create generators from rule constants, catalogs and a reference date.
    pub fn new(rules: &RuleConfig, generation: &GenerationConfig, today: NaiveDate) -> Self {
        Self {
            rules: rules.clone(),
            generation: generation.clone(),
            today,
        }
    }

    /// Create generators from a run configuration.
    pub fn from_config(config: &SynthConfig) -> Self {
        Self::new(&config.rules, &config.generation, config.today())
    }

    /// Reference date.
    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// A fully compliant record for spreadsheet row `sheet_row`.
    ///
    /// Fields are drawn in a fixed order: beneficiary, invoice, amount,
    /// date, IBAN, BIC, country.
    pub fn compliant(&self, sheet_row: usize, rng: &mut impl Rng) -> Record {
        let beneficiary = self.beneficiary(rng);
        let invoice_number = self.invoice_number(sheet_row, rng);
        let amount = self.amount(rng);
        let account_end_date = self.account_end_date(rng);
        let iban = self.iban(rng);
        let bic = self.bic(rng);
        let bank_country = self.bank_country(rng);
        Record {
            beneficiary,
            invoice_number,
            amount,
            account_end_date,
            iban,
            bic,
            bank_country,
        }
    }

    /// Overwrite the field targeted by `class` with a violating value.
    pub fn violate(&self, class: AnomalyClass, record: &mut Record, rng: &mut impl Rng) {
        match class {
            AnomalyClass::VerifyRib => record.beneficiary = self.rules.sentinel_beneficiary.clone(),
            AnomalyClass::InvoiceInvalid => record.invoice_number = self.invalid_invoice(rng),
            AnomalyClass::AmountHigh => record.amount = self.high_amount(rng),
            AnomalyClass::DatePast => record.account_end_date = self.past_date(rng),
            AnomalyClass::IbanFlagged => record.iban = self.flagged_iban(rng),
            AnomalyClass::BicBlockedPrimary => record.bic = self.primary_blocked_bic(rng),
            AnomalyClass::BicBlockedSecondary => record.bic = self.secondary_blocked_bic(rng),
            AnomalyClass::CountryInvalid => record.bank_country = self.invalid_country(rng),
        }
    }

    /// Catalog name, sometimes with a suffix variant.
    pub fn beneficiary(&self, rng: &mut impl Rng) -> String {
        let base = pick(&self.generation.beneficiaries, rng);
        if rng.gen::<f64>() < self.generation.suffix_probability {
            let suffix = pick(&self.generation.beneficiary_suffixes, rng);
            format!("{}{}", base, suffix).trim().to_string()
        } else {
            base.to_string()
        }
    }

    /// `<prefix><row:06>-<4 digits>`.
    pub fn invoice_number(&self, sheet_row: usize, rng: &mut impl Rng) -> String {
        format!(
            "{}{:06}-{}",
            self.generation.invoice_prefix,
            sheet_row,
            digits(4, rng)
        )
    }

    /// Whole amount below the high-value threshold.
    pub fn amount(&self, rng: &mut impl Rng) -> f64 {
        rng.gen_range(self.generation.amount_min..self.rules.amount_threshold) as f64
    }

    /// Date within the due window, starting today.
    pub fn account_end_date(&self, rng: &mut impl Rng) -> NaiveDate {
        let days = rng.gen_range(0..=self.generation.due_window_days);
        self.today
            .checked_add_days(Days::new(days as u64))
            .unwrap_or(self.today)
    }

    /// IBAN that ends with no flagged suffix.
    pub fn iban(&self, rng: &mut impl Rng) -> String {
        let mut iban = self.raw_iban(rng);
        // Step the last digit away from a flagged suffix.
        for _ in 0..DIGITS.len() {
            if !self.is_flagged_iban(&iban) {
                break;
            }
            if let Some(last) = iban.pop() {
                let next = last.to_digit(10).map(|d| (d + 1) % 10).unwrap_or(0);
                iban.push(char::from(b'0' + next as u8));
            }
        }
        iban
    }

    /// Bank code, mid token and branch; never starts with a blocked prefix.
    pub fn bic(&self, rng: &mut impl Rng) -> String {
        let bic = format!("{}{}{}", upper(4, rng), self.generation.bic_mid_token, alnum(3, rng));
        if self.rules.blocked_bic_prefixes().any(|p| bic.starts_with(p)) {
            format!("{}{}", self.generation.bic_neutral_token, &bic[4..])
        } else {
            bic
        }
    }

    /// Country from the allow-list.
    pub fn bank_country(&self, rng: &mut impl Rng) -> String {
        pick(&self.rules.allowed_countries, rng).to_string()
    }

    /// Invoice number with a uniformly drawn defect.
    pub fn invalid_invoice(&self, rng: &mut impl Rng) -> String {
        let defect = InvoiceDefect::ALL[rng.gen_range(0..InvoiceDefect::ALL.len())];
        self.invoice_with_defect(defect, rng)
    }

    /// Invoice number exhibiting `defect`.
    pub fn invoice_with_defect(&self, defect: InvoiceDefect, rng: &mut impl Rng) -> String {
        let token = &self.rules.invoice_token;
        match defect {
            InvoiceDefect::Empty => String::new(),
            InvoiceDefect::ReservedPrefix => format!("{}{}", token, alnum(9, rng)),
            InvoiceDefect::ReservedSuffix => format!("{}{}", alnum(9, rng), token),
            InvoiceDefect::LeadingSymbol => format!("_{}", alnum(10, rng)),
        }
    }

    /// Whole amount at or above the threshold.
    pub fn high_amount(&self, rng: &mut impl Rng) -> f64 {
        rng.gen_range(self.rules.amount_threshold..=self.generation.amount_max) as f64
    }

    /// Date strictly before the reference date.
    pub fn past_date(&self, rng: &mut impl Rng) -> NaiveDate {
        let days = rng.gen_range(1..=self.generation.past_window_days);
        self.today
            .checked_sub_days(Days::new(days as u64))
            .unwrap_or(NaiveDate::MIN)
    }

    /// IBAN whose tail is overwritten by a flagged suffix, length preserved.
    pub fn flagged_iban(&self, rng: &mut impl Rng) -> String {
        let base = self.raw_iban(rng);
        let suffix = pick(&self.rules.iban_flagged_suffixes, rng);
        let keep = base.len().saturating_sub(suffix.len());
        format!("{}{}", &base[..keep], suffix)
    }

    /// Empty with probability 1/3, otherwise a primary prefix padded to a
    /// full BIC.
    pub fn primary_blocked_bic(&self, rng: &mut impl Rng) -> String {
        if rng.gen::<f64>() < 1.0 / 3.0 {
            return String::new();
        }
        let prefix = pick(&self.rules.bic_primary_prefixes, rng);
        pad_bic(prefix, rng)
    }

    /// A secondary prefix padded to a full BIC.
    pub fn secondary_blocked_bic(&self, rng: &mut impl Rng) -> String {
        let prefix = pick(&self.rules.bic_secondary_prefixes, rng);
        pad_bic(prefix, rng)
    }

    /// Country outside the allow-list.
    pub fn invalid_country(&self, rng: &mut impl Rng) -> String {
        pick(&self.rules.invalid_countries, rng).to_string()
    }

    fn raw_iban(&self, rng: &mut impl Rng) -> String {
        format!("{}{}", self.generation.iban_country, digits(IBAN_DIGITS, rng))
    }

    fn is_flagged_iban(&self, iban: &str) -> bool {
        self.rules
            .iban_flagged_suffixes
            .iter()
            .any(|s| iban.ends_with(s.as_str()))
    }
}

fn pad_bic(prefix: &str, rng: &mut impl Rng) -> String {
    format!("{}{}", prefix, alnum(BIC_LENGTH.saturating_sub(prefix.len()), rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ReviewRules;
    use proptest::prelude::*;
    use rand::rngs::StdRng;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 4).unwrap()
    }

    fn generators() -> FieldGenerators {
        FieldGenerators::new(&RuleConfig::default(), &GenerationConfig::default(), today())
    }

    fn reviewer() -> ReviewRules {
        ReviewRules::new(&RuleConfig::default(), today())
    }

    #[test]
    fn test_invoice_number_shape() {
        let mut rng = StdRng::seed_from_u64(1);
        let invoice = generators().invoice_number(42, &mut rng);
        assert!(invoice.starts_with("FA000042-"));
        assert_eq!(invoice.len(), 13);
        assert!(invoice[9..].bytes().all(|b| b.is_ascii_digit()));
    }

    #[test]
    fn test_invoice_defects() {
        let mut rng = StdRng::seed_from_u64(2);
        let g = generators();
        assert_eq!(g.invoice_with_defect(InvoiceDefect::Empty, &mut rng), "");

        let prefixed = g.invoice_with_defect(InvoiceDefect::ReservedPrefix, &mut rng);
        assert_eq!(prefixed.len(), 12);
        assert!(prefixed.starts_with("TIT"));
        assert!(prefixed[3..].bytes().all(|b| ALNUM.contains(&b)));

        let suffixed = g.invoice_with_defect(InvoiceDefect::ReservedSuffix, &mut rng);
        assert!(suffixed.ends_with("TIT"));
        assert_eq!(suffixed.len(), 12);

        let symbol = g.invoice_with_defect(InvoiceDefect::LeadingSymbol, &mut rng);
        assert!(symbol.starts_with('_'));
        assert_eq!(symbol.len(), 11);
    }

    #[test]
    fn test_compliant_iban_steps_away_from_flagged_suffix() {
        let mut rules = RuleConfig::default();
        // Every IBAN ending in 0 is flagged.
        rules.iban_flagged_suffixes = vec!["0".to_string()];
        let g = FieldGenerators::new(&rules, &GenerationConfig::default(), today());
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let iban = g.iban(&mut rng);
            assert_eq!(iban.len(), 27);
            assert!(!iban.ends_with('0'));
        }
    }

    #[test]
    fn test_flagged_iban_keeps_length() {
        let g = generators();
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..50 {
            let iban = g.flagged_iban(&mut rng);
            assert_eq!(iban.len(), 27);
            assert!(iban.starts_with("FR"));
        }
    }

    #[test]
    fn test_bic_collision_uses_neutral_bank_code() {
        let mut rules = RuleConfig::default();
        // Any generated bank code collides with a one-letter prefix set.
        rules.bic_secondary_prefixes = ('A'..='Z').filter(|c| *c != 'A').map(String::from).collect();
        let g = FieldGenerators::new(&rules, &GenerationConfig::default(), today());
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..50 {
            let bic = g.bic(&mut rng);
            assert_eq!(bic.len(), BIC_LENGTH);
            assert!(bic.starts_with('A'));
            assert_eq!(&bic[4..8], "FRPP");
        }
    }

    #[test]
    fn test_blocked_bics_are_full_length() {
        let g = generators();
        let mut rng = StdRng::seed_from_u64(6);
        let mut empties = 0;
        for _ in 0..300 {
            let bic = g.primary_blocked_bic(&mut rng);
            if bic.is_empty() {
                empties += 1;
            } else {
                assert_eq!(bic.len(), BIC_LENGTH);
                assert!(bic.starts_with("TRPU") || bic.starts_with("BDFEFRPP"));
            }
            assert_eq!(g.secondary_blocked_bic(&mut rng).len(), BIC_LENGTH);
        }
        assert!(empties > 50 && empties < 150, "empties = {}", empties);
    }

    #[test]
    fn test_date_windows() {
        let g = generators();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let due = g.account_end_date(&mut rng);
            assert!(due >= today() && due <= today() + Days::new(90));
            let past = g.past_date(&mut rng);
            assert!(past < today() && past >= today() - Days::new(365));
        }
    }

    proptest! {
        #[test]
        fn prop_compliant_records_pass_every_rule(seed in any::<u64>(), row in 2usize..1_000_000) {
            let mut rng = StdRng::seed_from_u64(seed);
            let record = generators().compliant(row, &mut rng);
            prop_assert!(record.amount >= 50.0 && record.amount <= 799_999.0);
            prop_assert_eq!(reviewer().violations(&record), Vec::<AnomalyClass>::new());
        }

        #[test]
        fn prop_violation_is_flagged_by_its_class_only(seed in any::<u64>(), class_idx in 0u8..8) {
            let class = AnomalyClass::from_u8(class_idx).unwrap();
            let g = generators();
            let mut rng = StdRng::seed_from_u64(seed);
            let mut record = g.compliant(2, &mut rng);
            g.violate(class, &mut record, &mut rng);
            prop_assert_eq!(reviewer().violations(&record), vec![class]);
        }
    }
}
