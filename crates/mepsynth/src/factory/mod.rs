//! Record factory: field generators, anomaly scheduling, per-record
//! synthesis and the whole-workbook run.

mod assembler;
mod fields;
mod report;
mod scheduler;
mod synthesizer;

pub use assembler::DatasetAssembler;
pub use fields::{FieldGenerators, InvoiceDefect};
pub use report::{SynthReport, SynthWarning};
pub use scheduler::{AnomalyScheduler, Outcome};
pub use synthesizer::RecordSynthesizer;
