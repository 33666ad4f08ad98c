//! Core data types for payment-sheet synthesis.

mod anomaly;
mod field;
mod record;

pub use anomaly::AnomalyClass;
pub use field::Field;
pub use record::Record;
