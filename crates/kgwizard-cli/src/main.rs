//! kgwizard: turn experimental records into a knowledge graph.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use kgwizard_cli::cli::Cli;
use kgwizard_cli::commands;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `.env` first so it can feed the env-backed flags
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    commands::run(cli.command).await
}
