use anyhow::Result;
use clap::{Parser, Subcommand};
use fxdash::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for fxdash::AppCommand {
    fn from(cmd: Commands) -> fxdash::AppCommand {
        match cmd {
            Commands::Serve => fxdash::AppCommand::Serve,
            Commands::Rates { base } => fxdash::AppCommand::Rates { base },
            Commands::Convert { amount, from, to } => {
                fxdash::AppCommand::Convert { amount, from, to }
            }
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Serve the dashboard (default)
    Serve,
    /// Display latest exchange rates
    Rates {
        /// Base currency, defaults to the configured one
        #[arg(short, long, value_parser = parse_code)]
        base: Option<String>,
    },
    /// Convert an amount between two currencies
    Convert {
        amount: f64,
        #[arg(value_parser = parse_code)]
        from: String,
        #[arg(value_parser = parse_code)]
        to: String,
    },
}

/// Currency codes are upper-case three-letter strings.
fn parse_code(raw: &str) -> Result<String, String> {
    let code = raw.trim().to_uppercase();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code)
    } else {
        Err(format!("'{raw}' is not a three-letter currency code"))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let command = cli.command.unwrap_or(Commands::Serve);
    let result = match command {
        Commands::Setup => fxdash::cli::setup::setup(),
        cmd => fxdash::run_command(cmd.into(), cli.config_path.as_deref()).await,
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
