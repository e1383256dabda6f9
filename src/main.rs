use anyhow::Result;
use clap::Parser;
use fiado::cli::Cli;
use tracing::Level;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    cli.run().await
}
