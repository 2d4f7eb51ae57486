mod commands;
mod http;
mod render;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use daystrip_core::DayStripConfig;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "daystrip")]
#[command(version, about = "A deduplicated multi-day agenda from all your calendar feeds")]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the day strip once
    Show {
        /// Number of days to show
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        days: Option<u32>,

        /// First day, relative to today (e.g. -1 for yesterday)
        #[arg(long, allow_negative_numbers = true)]
        offset: Option<i64>,

        /// Print the day views as JSON
        #[arg(long)]
        json: bool,
    },
    /// Keep the strip on screen, refetching on the configured interval
    Watch,
    /// Fetch and expand the configured ICS feeds, printing raw JSON
    Fetch {
        /// Range start (RFC 3339 or YYYY-MM-DD); defaults to the display window
        #[arg(long)]
        from: Option<String>,

        /// Range end (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },
    /// Manage the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Write a commented default config file
    Init,
    /// Print the config file location
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Show { days, offset, json } => {
            commands::show::run(DayStripConfig::load()?, days, offset, json).await
        }
        Commands::Watch => commands::watch::run(DayStripConfig::load()?).await,
        Commands::Fetch { from, to } => {
            commands::fetch::run(DayStripConfig::load()?, from, to).await
        }
        Commands::Config { command } => match command {
            ConfigCommand::Init => commands::config::init(),
            ConfigCommand::Path => commands::config::path(),
        },
    }
}

/// Logs go to stderr so stdout stays clean for the strip and JSON output.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("daystrip=debug,daystrip_core=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("daystrip=info,daystrip_core=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
