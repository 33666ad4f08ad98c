//! mepsynth CLI - synthetic payment-sheet generation and auditing.
//!
//! # Commands
//!
//! - `mepsynth generate` - Rewrite the payment sheet with synthetic records
//! - `mepsynth check <file>` - Re-apply the reviewer rules to a workbook
//! - `mepsynth rules` - List the anomaly catalog
//! - `mepsynth init` - Write a default `mepsynth.toml`
//!
//! # Examples
//!
//! ```bash
//! # Generate with the reference seed and a fixed reference date
//! mepsynth generate --input data/raw/input_sensible.xlsx --reference-date 2026-02-04
//!
//! # Verify every anomaly class is present in the output
//! mepsynth check data/demo/mep_anonymized.xlsx --detailed
//! ```

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;

use commands::{check, generate, init, rules, ConfigArgs};

/// mepsynth - synthetic payment sheets with guaranteed reviewer anomalies
#[derive(Parser)]
#[command(name = "mepsynth")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite the payment sheet of a workbook with synthetic records
    Generate {
        #[command(flatten)]
        config: ConfigArgs,

        /// Source workbook
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Destination workbook
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Bonus anomaly rate for non-forced records
        #[arg(long)]
        bonus_rate: Option<f64>,

        /// Synthesize without writing the output workbook
        #[arg(long)]
        dry_run: bool,
    },

    /// Re-apply the reviewer rules to a workbook
    Check {
        /// Workbook to audit (default: configured output)
        file: Option<PathBuf>,

        #[command(flatten)]
        config: ConfigArgs,

        /// List every flagged record
        #[arg(long)]
        detailed: bool,
    },

    /// List the anomaly catalog and its rule constants
    Rules {
        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Write a default configuration file
    Init {
        /// Target file
        #[arg(short, long, default_value = commands::DEFAULT_CONFIG)]
        path: PathBuf,

        /// Overwrite existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

fn print_banner() {
    println!(
        "  {} {}\n",
        "mepsynth - synthetic payment sheets".bright_white(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let show_banner = !cli.quiet && !matches!(cli.command, Commands::Completions { .. });
    if show_banner {
        print_banner();
    }

    let result = match cli.command {
        Commands::Generate {
            config,
            input,
            output,
            bonus_rate,
            dry_run,
        } => generate::execute(&config, input, output, bonus_rate, dry_run),

        Commands::Check {
            file,
            config,
            detailed,
        } => check::execute(file.as_deref(), &config, detailed),

        Commands::Rules { config } => rules::execute(config.as_deref()),

        Commands::Init { path, force } => init::execute(&path, force),

        Commands::Completions { shell } => {
            use clap::CommandFactory;
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "mepsynth",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_overrides_parse() {
        let cli = Cli::try_parse_from([
            "mepsynth",
            "generate",
            "--seed",
            "7",
            "--reference-date",
            "2026-02-04",
            "--bonus-rate",
            "0.2",
            "-i",
            "in.xlsx",
        ])
        .unwrap();

        match cli.command {
            Commands::Generate {
                config,
                input,
                bonus_rate,
                ..
            } => {
                assert_eq!(config.seed, Some(7));
                assert_eq!(input, Some(PathBuf::from("in.xlsx")));
                assert_eq!(bonus_rate, Some(0.2));
            }
            _ => panic!("expected generate"),
        }
    }
}
