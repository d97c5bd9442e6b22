use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    askides_server::run_with_cli(askides_server::cli::Cli::parse()).await
}
