//! `mepsynth rules` command - List the anomaly catalog.

use std::path::Path;

use colored::Colorize;
use mepsynth::prelude::*;

use crate::error::CliResult;

use super::load_config;

/// Execute the `rules` command.
pub fn execute(config_path: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let rules = &config.rules;

    println!("{}:", "Anomaly catalog".bright_white().underline());
    println!();
    for class in AnomalyClass::ALL {
        println!(
            "  {} {:<22} {:<17} {}",
            "•".dimmed(),
            class.code().bright_white(),
            config.columns.column(class.target()).bright_yellow(),
            class.description()
        );
    }
    println!();

    println!("{}:", "Rule constants".bright_white().underline());
    println!("  sentinel beneficiary   {}", rules.sentinel_beneficiary);
    println!("  invoice token          {}", rules.invoice_token);
    println!("  amount threshold       {}", rules.amount_threshold);
    println!("  allowed countries      {}", rules.allowed_countries.join(", "));
    println!("  BIC primary prefixes   {}", rules.bic_primary_prefixes.join(", "));
    println!("  BIC secondary prefixes {}", rules.bic_secondary_prefixes.join(", "));
    println!("  IBAN flagged suffixes  {}", rules.iban_flagged_suffixes.join(", "));
    Ok(())
}
