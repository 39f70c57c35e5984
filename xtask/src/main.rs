mod ci;
mod test;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Development task runner for the inventory smoke harness")]
struct Args {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run CI checks
    Ci(ci::CiArgs),
    /// Run tests
    Test(test::TestArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    match Args::parse().cmd {
        Command::Ci(args) => ci::run(args).await,
        Command::Test(args) => test::run(args).await,
    }
}
