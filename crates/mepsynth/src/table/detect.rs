//! Column-name heuristics.

use crate::config::DetectionConfig;

/// Decides from a column name whether it holds amounts, countries or dates.
///
/// The keyword heuristic is imprecise by nature; tests substitute fixed
/// classifiers through this trait.
pub trait ColumnClassifier {
    /// Whether the column holds monetary amounts.
    fn is_amount_like(&self, name: &str) -> bool;
    /// Whether the column holds country codes.
    fn is_country_like(&self, name: &str) -> bool;
    /// Whether the column holds dates.
    fn is_date_like(&self, name: &str) -> bool;
}

/// Trim, lowercase and collapse inner whitespace.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Substring matching on normalized column names.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    amount: Vec<String>,
    amount_exclude: Vec<String>,
    country: Vec<String>,
    date: Vec<String>,
}

impl KeywordClassifier {
    /// Build a classifier from detection settings.
    pub fn new(config: &DetectionConfig) -> Self {
        let norm = |keywords: &[String]| -> Vec<String> {
            keywords
                .iter()
                .map(|k| normalize_name(k))
                .filter(|k| !k.is_empty())
                .collect()
        };
        Self {
            amount: norm(&config.amount_keywords),
            amount_exclude: norm(&config.amount_exclude_keywords),
            country: norm(&config.country_keywords),
            date: norm(&config.date_keywords),
        }
    }

    fn contains_any(name: &str, keywords: &[String]) -> bool {
        let name = normalize_name(name);
        keywords.iter().any(|k| name.contains(k.as_str()))
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(&DetectionConfig::default())
    }
}

impl ColumnClassifier for KeywordClassifier {
    fn is_amount_like(&self, name: &str) -> bool {
        !Self::contains_any(name, &self.amount_exclude) && Self::contains_any(name, &self.amount)
    }

    fn is_country_like(&self, name: &str) -> bool {
        Self::contains_any(name, &self.country)
    }

    fn is_date_like(&self, name: &str) -> bool {
        Self::contains_any(name, &self.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Total   à\tPayer "), "total à payer");
    }

    #[test]
    fn test_amount_detection_with_exclusions() {
        let c = KeywordClassifier::default();
        assert!(c.is_amount_like("Total à payer"));
        assert!(c.is_amount_like("MONTANT HT"));
        assert!(c.is_amount_like("Intérêts moratoires"));
        assert!(c.is_amount_like("Retenue de garantie"));
        assert!(!c.is_amount_like("Motif du montant"));
        assert!(!c.is_amount_like("Contrat total"));
        assert!(!c.is_amount_like("IBAN"));
    }

    #[test]
    fn test_country_and_date_detection() {
        let c = KeywordClassifier::default();
        assert!(c.is_country_like("Pays de la banque"));
        assert!(c.is_country_like("Supplier Country"));
        assert!(!c.is_country_like("BIC"));
        assert!(c.is_date_like("Date de fin du compte"));
        assert!(!c.is_date_like("Numéro"));
    }
}
