//! vboxmon CLI - watch and control VirtualBox machines.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod format;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.global.log_level.as_str()));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::List(args) => commands::list::execute(args, &cli.global).await,
        Commands::Info(args) => commands::info::execute(args, &cli.global).await,
        Commands::Start(args) => commands::start::execute(args, &cli.global).await,
        Commands::Stop(args) => commands::stop::execute(args, &cli.global).await,
        Commands::Pause(args) => commands::pause::execute(args, &cli.global).await,
        Commands::Save(args) => commands::save::execute(args, &cli.global).await,
        Commands::Resume(args) => commands::resume::execute(args, &cli.global).await,
        Commands::Watch(args) => commands::watch::execute(args, &cli.global).await,
    }
}
