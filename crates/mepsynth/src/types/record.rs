//! Payment record produced by the synthesizer.

use super::Field;
use crate::table::CellValue;
use chrono::NaiveDate;

/// One fully populated row of the target sheet, by semantic role.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Payee organization name.
    pub beneficiary: String,
    /// Invoice reference.
    pub invoice_number: String,
    /// Primary amount, whole units.
    pub amount: f64,
    /// Account end date.
    pub account_end_date: NaiveDate,
    /// Beneficiary IBAN.
    pub iban: String,
    /// Beneficiary bank BIC.
    pub bic: String,
    /// Two-letter bank country code.
    pub bank_country: String,
}

impl Record {
    /// The value this record holds for `field`, as a sheet cell.
    pub fn cell(&self, field: Field) -> CellValue {
        match field {
            Field::Beneficiary => CellValue::Text(self.beneficiary.clone()),
            Field::InvoiceNumber => CellValue::Text(self.invoice_number.clone()),
            Field::Amount => CellValue::Number(self.amount),
            Field::AccountEndDate => CellValue::Date(self.account_end_date),
            Field::Iban => CellValue::Text(self.iban.clone()),
            Field::Bic => CellValue::Text(self.bic.clone()),
            Field::BankCountry => CellValue::Text(self.bank_country.clone()),
        }
    }
}
