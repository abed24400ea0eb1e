use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use fxswap::core::log::init_logging;

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

impl From<Commands> for fxswap::AppCommand {
    fn from(cmd: Commands) -> fxswap::AppCommand {
        match cmd {
            Commands::Rates { search } => fxswap::AppCommand::Rates { search },
            Commands::Convert {
                from,
                to,
                amount,
                swap,
            } => fxswap::AppCommand::Convert {
                from,
                to,
                amount,
                swap,
            },
            Commands::Popular => fxswap::AppCommand::Popular,
            Commands::Balances { literal_filter } => {
                fxswap::AppCommand::Balances { literal_filter }
            }
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// List the latest price of every currency
    Rates {
        /// Only show currencies whose code contains this text (case-insensitive)
        #[arg(long)]
        search: Option<String>,
    },
    /// Convert an amount from one currency to another
    Convert {
        /// Currency you pay with, defaults to the first popular currency
        #[arg(long)]
        from: Option<String>,
        /// Currency you receive, defaults to the first popular currency
        #[arg(long)]
        to: Option<String>,
        /// Amount of the source currency
        #[arg(long)]
        amount: f64,
        /// Swap source and target before converting
        #[arg(long)]
        swap: bool,
    },
    /// Show trending currencies
    Popular,
    /// Rank wallet balances by blockchain priority
    Balances {
        /// Keep only empty or negative balances, as the legacy wallet page did
        #[arg(long)]
        literal_filter: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => fxswap::cli::setup::setup_at_path(path),
            None => fxswap::cli::setup::setup(),
        },
        Some(cmd) => fxswap::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
