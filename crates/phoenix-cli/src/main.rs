mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::batch::BatchArgs;
use commands::calculate::CalculateArgs;
use commands::validate::ValidateArgs;

/// Phoenix autocallable payoff calculations
#[derive(Parser)]
#[command(
    name = "phoenix",
    version,
    about = "Phoenix autocallable payoff calculations",
    long_about = "A CLI for evaluating Phoenix autocallable structured notes against \
                  observed or simulated price paths with decimal precision. Supports \
                  single-underlying and worst-of baskets, memory coupons, autocall and \
                  maturity knock-in."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one product against one price path
    Calculate(CalculateArgs),
    /// Evaluate one product against many price paths
    Batch(BatchArgs),
    /// Check a term sheet without calculating
    Validate(ValidateArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Calculate(args) => commands::calculate::run_calculate(args),
        Commands::Batch(args) => commands::batch::run_batch(args),
        Commands::Validate(args) => commands::validate::run_validate(args),
        Commands::Version => {
            println!("phoenix {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
