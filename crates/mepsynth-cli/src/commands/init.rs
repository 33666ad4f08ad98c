//! `mepsynth init` command - Write a default configuration file.

use std::fs;
use std::path::Path;

use colored::Colorize;
use mepsynth::SynthConfig;

use crate::error::{CliError, CliResult};

/// Execute the `init` command.
pub fn execute(path: &Path, force: bool) -> CliResult<()> {
    if path.exists() && !force {
        return Err(CliError::Config(format!(
            "{} already exists. Use --force to overwrite.",
            path.display()
        )));
    }

    println!("{} Writing default configuration", "→".bright_cyan());

    write_default_config(path)?;
    println!("  {} Created {}", "✓".bright_green(), path.display());

    println!();
    println!(
        "  Edit {} to match the column names of your export, then run:",
        path.display().to_string().bright_white()
    );
    println!("    {}", "mepsynth generate".bright_white());
    println!();
    Ok(())
}

fn write_default_config(path: &Path) -> CliResult<()> {
    let body = SynthConfig::default().to_toml_string()?;
    let content = format!(
        "# mepsynth configuration\n#\n# reference_date = \"YYYY-MM-DD\" pins the run's today for reproducible output.\n\n{}",
        body
    );
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}
