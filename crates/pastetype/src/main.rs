use clap::Parser;

use pastetype::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pastetype::init();

    Cli::parse().run().await
}
