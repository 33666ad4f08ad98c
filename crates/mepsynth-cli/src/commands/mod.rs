//! CLI command implementations.

pub mod check;
pub mod generate;
pub mod init;
pub mod rules;

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::Args;
use colored::Colorize;
use mepsynth::SynthConfig;

use crate::error::CliResult;

/// Configuration file picked up from the working directory.
pub const DEFAULT_CONFIG: &str = "mepsynth.toml";

/// Configuration file plus the overrides shared by every run command.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Configuration file (default: ./mepsynth.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Sheet holding the payment records
    #[arg(long)]
    pub sheet: Option<String>,

    /// Zero-based row holding the column names
    #[arg(long)]
    pub header_row: Option<usize>,

    /// Seed of the pseudo-random stream
    #[arg(long)]
    pub seed: Option<u64>,

    /// Reference date, YYYY-MM-DD (default: today)
    #[arg(long)]
    pub reference_date: Option<NaiveDate>,
}

impl ConfigArgs {
    /// Load the configuration and apply command-line overrides.
    pub fn resolve(&self) -> CliResult<SynthConfig> {
        let mut config = load_config(self.config.as_deref())?;
        if let Some(sheet) = &self.sheet {
            config.sheet = sheet.clone();
        }
        if let Some(header_row) = self.header_row {
            config.header_row = header_row;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(date) = self.reference_date {
            config.reference_date = Some(date);
        }
        config.validate()?;
        Ok(config)
    }
}

/// Load `path`, or `./mepsynth.toml` when present, or the defaults.
pub fn load_config(path: Option<&Path>) -> CliResult<SynthConfig> {
    match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading configuration");
            Ok(SynthConfig::load(path)?)
        }
        None if Path::new(DEFAULT_CONFIG).exists() => {
            tracing::debug!(path = DEFAULT_CONFIG, "loading configuration");
            Ok(SynthConfig::load(DEFAULT_CONFIG)?)
        }
        None => Ok(SynthConfig::default()),
    }
}

/// Print a `label: value` line in the report style.
pub fn print_field(label: &str, value: impl std::fmt::Display) {
    println!("  {} {}: {}", "•".dimmed(), label, value.to_string().bright_yellow());
}
