//! Anomaly classes checked by the downstream reviewer.

use super::Field;
use serde::{Deserialize, Serialize};

/// The closed catalog of anomaly classes.
///
/// Each class targets exactly one [`Field`] and is realized by one
/// violating generator (see [`crate::factory::FieldGenerators::violate`]) and
/// detected by one predicate (see [`crate::rules::ReviewRules::flags`]).
/// Declaration order is the catalog order used for forced assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum AnomalyClass {
    /// Beneficiary equals the manual bank-detail review sentinel.
    VerifyRib = 0,
    /// Invoice number is empty, wrapped by the reserved token, or starts
    /// with a non-alphanumeric character.
    InvoiceInvalid = 1,
    /// Primary amount at or above the high-value threshold.
    AmountHigh = 2,
    /// Account-end date strictly before the reference date.
    DatePast = 3,
    /// IBAN ends with a flagged suffix.
    IbanFlagged = 4,
    /// BIC empty or starting with a primary reserved bank code.
    BicBlockedPrimary = 5,
    /// BIC starting with a secondary reserved bank-code prefix.
    BicBlockedSecondary = 6,
    /// Bank country outside the allow-list.
    CountryInvalid = 7,
}

impl AnomalyClass {
    /// Every class, in catalog order.
    pub const ALL: [AnomalyClass; 8] = [
        AnomalyClass::VerifyRib,
        AnomalyClass::InvoiceInvalid,
        AnomalyClass::AmountHigh,
        AnomalyClass::DatePast,
        AnomalyClass::IbanFlagged,
        AnomalyClass::BicBlockedPrimary,
        AnomalyClass::BicBlockedSecondary,
        AnomalyClass::CountryInvalid,
    ];

    /// Number of classes in the catalog.
    pub const COUNT: usize = Self::ALL.len();

    /// The field this class mutates.
    pub fn target(&self) -> Field {
        match self {
            AnomalyClass::VerifyRib => Field::Beneficiary,
            AnomalyClass::InvoiceInvalid => Field::InvoiceNumber,
            AnomalyClass::AmountHigh => Field::Amount,
            AnomalyClass::DatePast => Field::AccountEndDate,
            AnomalyClass::IbanFlagged => Field::Iban,
            AnomalyClass::BicBlockedPrimary | AnomalyClass::BicBlockedSecondary => Field::Bic,
            AnomalyClass::CountryInvalid => Field::BankCountry,
        }
    }

    /// Stable identifier used in reports and configuration.
    pub fn code(&self) -> &'static str {
        match self {
            AnomalyClass::VerifyRib => "VERIFY_RIB",
            AnomalyClass::InvoiceInvalid => "INVOICE_INVALID",
            AnomalyClass::AmountHigh => "AMOUNT_HIGH",
            AnomalyClass::DatePast => "DATE_PAST",
            AnomalyClass::IbanFlagged => "IBAN_FLAGGED",
            AnomalyClass::BicBlockedPrimary => "BIC_BLOCKED_PRIMARY",
            AnomalyClass::BicBlockedSecondary => "BIC_BLOCKED_SECONDARY",
            AnomalyClass::CountryInvalid => "COUNTRY_INVALID",
        }
    }

    /// Human-readable description of the violating condition.
    pub fn description(&self) -> &'static str {
        match self {
            AnomalyClass::VerifyRib => "beneficiary equals the bank-detail review sentinel",
            AnomalyClass::InvoiceInvalid => {
                "invoice number empty, starts or ends with the reserved token, or starts with a non-alphanumeric character"
            }
            AnomalyClass::AmountHigh => "primary amount at or above the high-value threshold",
            AnomalyClass::DatePast => "account-end date before the reference date",
            AnomalyClass::IbanFlagged => "IBAN ends with a flagged suffix",
            AnomalyClass::BicBlockedPrimary => "BIC empty or starts with a primary reserved bank code",
            AnomalyClass::BicBlockedSecondary => "BIC starts with a secondary reserved bank-code prefix",
            AnomalyClass::CountryInvalid => "bank country outside the allow-list",
        }
    }

    /// Convert from u8.
    pub fn from_u8(v: u8) -> Option<Self> {
        Self::ALL.get(v as usize).copied()
    }

    /// Parse a class from its code (case-insensitive).
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|class| class.code().eq_ignore_ascii_case(code.trim()))
    }
}

impl std::fmt::Display for AnomalyClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
