use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use goldwatch::core::log::init_logging;

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

#[derive(Clone, Copy, ValueEnum)]
enum Series {
    /// Gold price per gram
    Gold,
    /// USD exchange rate
    Rates,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Serve the history API
    Serve,
    /// Fetch and store current market data now
    Refresh,
    /// Display recorded history, refreshing first if stale
    History {
        #[arg(value_enum)]
        series: Series,
        /// Show only the newest N records
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

impl From<Commands> for goldwatch::AppCommand {
    fn from(cmd: Commands) -> goldwatch::AppCommand {
        match cmd {
            Commands::Serve => goldwatch::AppCommand::Serve,
            Commands::Refresh => goldwatch::AppCommand::Refresh,
            Commands::History {
                series: Series::Gold,
                limit,
            } => goldwatch::AppCommand::GoldHistory { limit },
            Commands::History {
                series: Series::Rates,
                limit,
            } => goldwatch::AppCommand::RateHistory { limit },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => goldwatch::cli::setup::setup_at_path(path),
            None => goldwatch::cli::setup::setup(),
        },
        Some(cmd) => goldwatch::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
