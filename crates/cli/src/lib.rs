pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use shopmetrics_core::config::{EngineConfig, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "shopmetrics",
    about = "Shopmetrics extraction CLI",
    long_about = "Compute the sales fact table and derived analytics tables (CLV, RFM, \
                  product performance) from normalized retail CSVs, and export them for \
                  the reporting layer.",
    after_help = "Examples:\n  shopmetrics run --input data --output cleaned_data\n  shopmetrics check --input data\n  shopmetrics summary --input data"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a shopmetrics.toml config file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Load input tables, compute every derived table, and export CSVs")]
    Run {
        #[arg(long, help = "Directory holding the input CSV tables")]
        input: PathBuf,
        #[arg(long, help = "Directory to export the derived tables into")]
        output: PathBuf,
    },
    #[command(about = "Validate input tables and report integrity and quality findings")]
    Check {
        #[arg(long, help = "Directory holding the input CSV tables")]
        input: PathBuf,
    },
    #[command(about = "Print a run summary with totals and category revenue shares")]
    Summary {
        #[arg(long, help = "Directory holding the input CSV tables")]
        input: PathBuf,
    },
    #[command(about = "Export the calendar date dimension for the configured range")]
    Calendar {
        #[arg(long, help = "Directory to export date_dimension.csv into")]
        output: PathBuf,
    },
    #[command(about = "Inspect effective configuration values")]
    Config,
}

fn init_logging(config: &EngineConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        LogFormat::Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let load = LoadOptions { config_path: cli.config.clone(), require_file: cli.config.is_some() };
    let config = match EngineConfig::load(load) {
        Ok(config) => config,
        Err(error) => {
            let result = commands::CommandResult::failure(
                "config",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
            println!("{}", result.output);
            return ExitCode::from(result.exit_code);
        }
    };
    init_logging(&config);

    let result = match cli.command {
        Command::Run { input, output } => commands::run::run(&config, &input, &output),
        Command::Check { input } => commands::check::run(&config, &input),
        Command::Summary { input } => commands::summary::run(&config, &input),
        Command::Calendar { output } => commands::calendar::run(&config, &output),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(&config) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn parses_run_with_input_and_output() {
        let cli = Cli::parse_from(["shopmetrics", "run", "--input", "data", "--output", "out"]);
        match cli.command {
            Command::Run { input, output } => {
                assert_eq!(input.to_string_lossy(), "data");
                assert_eq!(output.to_string_lossy(), "out");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::parse_from(["shopmetrics", "check", "--input", "data", "--config", "c.toml"]);
        assert_eq!(cli.config.as_deref().map(|p| p.to_string_lossy().into_owned()),
            Some("c.toml".to_string()));
    }
}
