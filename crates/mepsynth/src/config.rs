//! Runtime configuration for a synthesis run.
//!
//! Every constant the reviewer rules and the generators depend on is exposed
//! here so a run can be reproduced from a single TOML file:
//!
//! ```toml
//! sheet = "MEP"
//! seed = 20260204
//! bonus_rate = 0.10
//! reference_date = "2026-02-04"
//!
//! [columns]
//! amount = "Total à payer"
//!
//! [rules]
//! amount_threshold = 800000
//! ```

use crate::error::{Result, SynthError};
use crate::types::Field;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration of a synthesis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Source workbook.
    pub input: PathBuf,
    /// Destination workbook.
    pub output: PathBuf,
    /// Sheet to synthesize; every other sheet is copied through.
    pub sheet: String,
    /// Zero-based row holding the column names.
    pub header_row: usize,
    /// Seed of the single pseudo-random stream.
    pub seed: u64,
    /// Probability that a non-forced record carries a bonus anomaly.
    pub bonus_rate: f64,
    /// The run's "today". Local date when absent.
    pub reference_date: Option<NaiveDate>,
    /// Role to column-name mapping.
    pub columns: RoleMapping,
    /// Reviewer rule constants.
    pub rules: RuleConfig,
    /// Generator catalogs and ranges.
    pub generation: GenerationConfig,
    /// Column detection heuristics.
    pub detection: DetectionConfig,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/raw/input_sensible.xlsx"),
            output: PathBuf::from("data/demo/mep_anonymized.xlsx"),
            sheet: "MEP".to_string(),
            header_row: 0,
            seed: 20260204,
            bonus_rate: 0.10,
            reference_date: None,
            columns: RoleMapping::default(),
            rules: RuleConfig::default(),
            generation: GenerationConfig::default(),
            detection: DetectionConfig::default(),
        }
    }
}

impl SynthConfig {
    /// Parse a configuration from TOML text. Missing keys take defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: SynthConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Render the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| SynthError::config(e.to_string()))
    }

    /// Reference date of the run.
    pub fn today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    /// Check that catalogs are usable and that compliant and violating
    /// ranges cannot overlap.
    pub fn validate(&self) -> Result<()> {
        if self.sheet.trim().is_empty() {
            return Err(SynthError::config("sheet name must not be empty"));
        }
        if !(0.0..=1.0).contains(&self.bonus_rate) {
            return Err(SynthError::config(format!(
                "bonus_rate must be within [0, 1], got {}",
                self.bonus_rate
            )));
        }
        self.columns.validate()?;
        self.rules.validate()?;
        self.generation.validate(&self.rules)?;
        self.detection.validate()
    }
}

/// Exact column name for each semantic role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleMapping {
    /// Beneficiary column (sheet column A in the reference layout).
    pub beneficiary: String,
    /// Invoice number column (C).
    pub invoice_number: String,
    /// Primary amount column (P).
    pub amount: String,
    /// Account end date column (R).
    pub account_end_date: String,
    /// IBAN column (S).
    pub iban: String,
    /// BIC column (T).
    pub bic: String,
    /// Bank country column (U).
    pub bank_country: String,
}

impl Default for RoleMapping {
    fn default() -> Self {
        Self {
            beneficiary: "Bénéficiaire".to_string(),
            invoice_number: "Numéro".to_string(),
            amount: "Total à payer".to_string(),
            account_end_date: "Date de fin du compte".to_string(),
            iban: "IBAN".to_string(),
            bic: "BIC".to_string(),
            bank_country: "Pays de la banque".to_string(),
        }
    }
}

impl RoleMapping {
    /// Column name configured for `field`.
    pub fn column(&self, field: Field) -> &str {
        match field {
            Field::Beneficiary => &self.beneficiary,
            Field::InvoiceNumber => &self.invoice_number,
            Field::Amount => &self.amount,
            Field::AccountEndDate => &self.account_end_date,
            Field::Iban => &self.iban,
            Field::Bic => &self.bic,
            Field::BankCountry => &self.bank_country,
        }
    }

    fn validate(&self) -> Result<()> {
        for (i, a) in Field::ALL.iter().enumerate() {
            if self.column(*a).is_empty() {
                return Err(SynthError::config(format!("column for role '{}' is empty", a)));
            }
            for b in &Field::ALL[i + 1..] {
                if self.column(*a) == self.column(*b) {
                    return Err(SynthError::config(format!(
                        "roles '{}' and '{}' map to the same column '{}'",
                        a,
                        b,
                        self.column(*a)
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Constants of the reviewer's detection predicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Beneficiary value that triggers manual bank-detail review.
    pub sentinel_beneficiary: String,
    /// Reserved three-letter invoice token.
    pub invoice_token: String,
    /// Amounts at or above this value are high-value.
    pub amount_threshold: u64,
    /// Accepted bank country codes.
    pub allowed_countries: Vec<String>,
    /// Codes drawn for invalid countries; disjoint from the allow-list.
    pub invalid_countries: Vec<String>,
    /// Primary reserved BIC prefixes.
    pub bic_primary_prefixes: Vec<String>,
    /// Secondary reserved BIC prefixes.
    pub bic_secondary_prefixes: Vec<String>,
    /// Flagged IBAN suffixes.
    pub iban_flagged_suffixes: Vec<String>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            sentinel_beneficiary: "AKAMAI".to_string(),
            invoice_token: "TIT".to_string(),
            amount_threshold: 800_000,
            allowed_countries: strings(&["FR", "RE", "MQ", "GP", "GF", "PF"]),
            invalid_countries: strings(&["DE", "ES", "IT", "US", "GB", "CH", "BE", "NL"]),
            bic_primary_prefixes: strings(&["TRPU", "BDFEFRPP"]),
            bic_secondary_prefixes: strings(&[
                "NORDFRPP", "TARNFR", "COURTFR", "KOLBFR", "BNUGFR", "RAPLFR", "SMCTFR", "SGBTMC",
                "SBGDFRP",
            ]),
            iban_flagged_suffixes: strings(&["1623", "3310", "9742", "43840"]),
        }
    }
}

impl RuleConfig {
    /// Primary and secondary reserved BIC prefixes together.
    pub fn blocked_bic_prefixes(&self) -> impl Iterator<Item = &str> {
        self.bic_primary_prefixes
            .iter()
            .chain(self.bic_secondary_prefixes.iter())
            .map(String::as_str)
    }

    fn validate(&self) -> Result<()> {
        if self.sentinel_beneficiary.is_empty() {
            return Err(SynthError::config("sentinel_beneficiary must not be empty"));
        }
        if self.invoice_token.is_empty() || self.invoice_token.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SynthError::config(
                "invoice_token must contain at least one non-digit character",
            ));
        }
        if self.amount_threshold == 0 {
            return Err(SynthError::config("amount_threshold must be positive"));
        }
        non_empty("allowed_countries", &self.allowed_countries)?;
        non_empty("invalid_countries", &self.invalid_countries)?;
        non_empty("bic_primary_prefixes", &self.bic_primary_prefixes)?;
        non_empty("bic_secondary_prefixes", &self.bic_secondary_prefixes)?;
        non_empty("iban_flagged_suffixes", &self.iban_flagged_suffixes)?;

        if let Some(code) = self
            .invalid_countries
            .iter()
            .find(|c| self.allowed_countries.contains(c))
        {
            return Err(SynthError::config(format!(
                "country '{}' is both allowed and invalid",
                code
            )));
        }
        if let Some(prefix) = self.blocked_bic_prefixes().find(|p| p.len() > BIC_LENGTH) {
            return Err(SynthError::config(format!(
                "BIC prefix '{}' is longer than {} characters",
                prefix, BIC_LENGTH
            )));
        }
        if let Some(suffix) = self
            .iban_flagged_suffixes
            .iter()
            .find(|s| s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()))
        {
            return Err(SynthError::config(format!(
                "IBAN suffix '{}' must be a non-empty digit string",
                suffix
            )));
        }
        if let Some(stem) = covering_iban_stem(&self.iban_flagged_suffixes) {
            return Err(SynthError::config(format!(
                "IBAN suffixes flag every final digit after '{}'",
                stem
            )));
        }
        Ok(())
    }
}

/// Tail after which every final digit ends with a flagged suffix, if any.
/// Compliant IBANs escape a flagged suffix by stepping their last digit,
/// which cannot succeed past such a tail.
fn covering_iban_stem(suffixes: &[String]) -> Option<&str> {
    fn stem(s: &String) -> &str {
        &s[..s.len().saturating_sub(1)]
    }
    suffixes.iter().map(stem).find(|tail| {
        (b'0'..=b'9').all(|digit| {
            suffixes
                .iter()
                .any(|s| s.as_bytes().last() == Some(&digit) && tail.ends_with(stem(s)))
        })
    })
}

/// Length of a generated BIC.
pub const BIC_LENGTH: usize = 11;

/// Digits following the two-letter IBAN country prefix.
pub const IBAN_DIGITS: usize = 25;

/// Catalogs and ranges of the field generators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Organization names for compliant beneficiaries.
    pub beneficiaries: Vec<String>,
    /// Suffix variants appended to beneficiaries.
    pub beneficiary_suffixes: Vec<String>,
    /// Probability of appending a suffix variant.
    pub suffix_probability: f64,
    /// Prefix of compliant invoice numbers.
    pub invoice_prefix: String,
    /// Lowest compliant amount.
    pub amount_min: u64,
    /// Highest high-value amount.
    pub amount_max: u64,
    /// Compliant dates fall within `[today, today + due_window_days]`.
    pub due_window_days: u32,
    /// Past dates fall within `[today - past_window_days, today - 1]`.
    pub past_window_days: u32,
    /// Two-letter IBAN country prefix.
    pub iban_country: String,
    /// Token between bank code and branch of a compliant BIC.
    pub bic_mid_token: String,
    /// Bank code substituted when a compliant BIC hits a blocked prefix.
    pub bic_neutral_token: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            beneficiaries: strings(&[
                "ORANGE SA",
                "ENGIE FRANCE",
                "SNCF RESEAU",
                "EDF COMMERCE",
                "TOTALENERGIES",
                "BNP PARIBAS",
                "CREDIT AGRICOLE",
                "AXA FRANCE",
                "LA POSTE",
                "VEOLIA EAU",
                "SUEZ EAU FRANCE",
                "SPIE BATIGNOLLES",
                "VINCI ENERGIES",
                "BOUYGUES TELECOM",
                "CAPGEMINI FRANCE",
            ]),
            beneficiary_suffixes: strings(&["", " - FR", " (FR)", " / DEP", " - SERVICES"]),
            suffix_probability: 0.25,
            invoice_prefix: "FA".to_string(),
            amount_min: 50,
            amount_max: 2_500_000,
            due_window_days: 90,
            past_window_days: 365,
            iban_country: "FR".to_string(),
            bic_mid_token: "FRPP".to_string(),
            bic_neutral_token: "ABCD".to_string(),
        }
    }
}

impl GenerationConfig {
    fn validate(&self, rules: &RuleConfig) -> Result<()> {
        non_empty("beneficiaries", &self.beneficiaries)?;
        non_empty("beneficiary_suffixes", &self.beneficiary_suffixes)?;
        if !(0.0..=1.0).contains(&self.suffix_probability) {
            return Err(SynthError::config("suffix_probability must be within [0, 1]"));
        }
        if self
            .beneficiaries
            .iter()
            .any(|b| b.trim() == rules.sentinel_beneficiary)
        {
            return Err(SynthError::config(format!(
                "beneficiary catalog contains the sentinel '{}'",
                rules.sentinel_beneficiary
            )));
        }
        if self.amount_min >= rules.amount_threshold {
            return Err(SynthError::config(format!(
                "amount_min ({}) must be below amount_threshold ({})",
                self.amount_min, rules.amount_threshold
            )));
        }
        if self.amount_max < rules.amount_threshold {
            return Err(SynthError::config(format!(
                "amount_max ({}) must be at least amount_threshold ({})",
                self.amount_max, rules.amount_threshold
            )));
        }
        if self.past_window_days == 0 {
            return Err(SynthError::config("past_window_days must be at least 1"));
        }
        if self.iban_country.len() != 2 || !self.iban_country.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(SynthError::config("iban_country must be two uppercase letters"));
        }
        if self.bic_neutral_token.len() != 4 {
            return Err(SynthError::config("bic_neutral_token must be 4 characters"));
        }
        if 4 + self.bic_mid_token.len() + 3 != BIC_LENGTH {
            return Err(SynthError::config(format!(
                "bic_mid_token must be {} characters",
                BIC_LENGTH - 7
            )));
        }
        let neutral = format!("{}{}", self.bic_neutral_token, self.bic_mid_token);
        if let Some(prefix) = rules
            .blocked_bic_prefixes()
            .find(|p| neutral.starts_with(p) || p.starts_with(&neutral))
        {
            return Err(SynthError::config(format!(
                "neutral BIC '{}' collides with blocked prefix '{}'",
                neutral, prefix
            )));
        }
        if self.invoice_prefix.is_empty()
            || !self.invoice_prefix.starts_with(|c: char| c.is_ascii_alphanumeric())
        {
            return Err(SynthError::config(format!(
                "invoice_prefix '{}' would produce invalid invoice numbers",
                self.invoice_prefix
            )));
        }
        let token = rules.invoice_token.as_str();
        if self.invoice_token_may_match(token) {
            return Err(SynthError::config(format!(
                "invoice_token '{}' may match compliant invoice numbers '{}dddddd-dddd'",
                token, self.invoice_prefix
            )));
        }
        Ok(())
    }

    /// Whether `token` can begin or end a compliant invoice number, that is
    /// the prefix, six row digits, a hyphen and four random digits.
    fn invoice_token_may_match(&self, token: &str) -> bool {
        // `None` stands for any digit.
        let shape: Vec<Option<char>> = self
            .invoice_prefix
            .chars()
            .map(Some)
            .chain(std::iter::repeat(None).take(6))
            .chain(std::iter::once(Some('-')))
            .chain(std::iter::repeat(None).take(4))
            .collect();
        let token: Vec<char> = token.chars().collect();
        if token.is_empty() || token.len() > shape.len() {
            return false;
        }
        let fits = |slots: &[Option<char>]| {
            slots.iter().zip(&token).all(|(slot, c)| match slot {
                Some(expected) => expected == c,
                None => c.is_ascii_digit(),
            })
        };
        fits(&shape[..token.len()]) || fits(&shape[shape.len() - token.len()..])
    }
}

/// Keyword heuristics used to find amount-, country- and date-like columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Substrings marking a column as amount-like.
    pub amount_keywords: Vec<String>,
    /// Substrings that veto the amount-like match.
    pub amount_exclude_keywords: Vec<String>,
    /// Substrings marking a column as country-like.
    pub country_keywords: Vec<String>,
    /// Substrings marking a column as date-like.
    pub date_keywords: Vec<String>,
    /// Non-empty cells sampled to decide whether a column holds text.
    pub text_sample_size: usize,
    /// Share of sampled cells containing letters above which a column is text.
    pub text_alpha_ratio: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            amount_keywords: strings(&[
                "montant", "total", "impay", "reten", "escomp", "intér", "interet", "à payer",
                "a payer", "payer",
            ]),
            amount_exclude_keywords: strings(&[
                "adresse",
                "comment",
                "motif",
                "description",
                "benef",
                "fournisseur",
                "site",
                "source",
                "contrat",
            ]),
            country_keywords: strings(&["pays", "country"]),
            date_keywords: strings(&["date"]),
            text_sample_size: 20,
            text_alpha_ratio: 0.2,
        }
    }
}

impl DetectionConfig {
    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.text_alpha_ratio) {
            return Err(SynthError::config("text_alpha_ratio must be within [0, 1]"));
        }
        Ok(())
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn non_empty(name: &str, items: &[String]) -> Result<()> {
    if items.is_empty() {
        return Err(SynthError::config(format!("{} must not be empty", name)));
    }
    Ok(())
}
