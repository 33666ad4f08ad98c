//! Semantic fields of a payment record.

use serde::{Deserialize, Serialize};

/// The seven semantic roles a payment record carries.
///
/// A field is both the role of a required column in the target sheet and
/// the target of an [`crate::types::AnomalyClass`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Payee organization name.
    Beneficiary,
    /// Invoice reference.
    InvoiceNumber,
    /// Primary amount to pay.
    Amount,
    /// Account end date.
    AccountEndDate,
    /// Beneficiary IBAN.
    Iban,
    /// Beneficiary bank BIC.
    Bic,
    /// Two-letter bank country code.
    BankCountry,
}

impl Field {
    /// Every field, in sheet-column order of the reference layout.
    pub const ALL: [Field; 7] = [
        Field::Beneficiary,
        Field::InvoiceNumber,
        Field::Amount,
        Field::AccountEndDate,
        Field::Iban,
        Field::Bic,
        Field::BankCountry,
    ];

    /// Snake-case identifier.
    pub fn name(&self) -> &'static str {
        match self {
            Field::Beneficiary => "beneficiary",
            Field::InvoiceNumber => "invoice_number",
            Field::Amount => "amount",
            Field::AccountEndDate => "account_end_date",
            Field::Iban => "iban",
            Field::Bic => "bic",
            Field::BankCountry => "bank_country",
        }
    }

    /// Whether values of this field are written as text.
    pub fn is_text(&self) -> bool {
        !matches!(self, Field::Amount | Field::AccountEndDate)
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
