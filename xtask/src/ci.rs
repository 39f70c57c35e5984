use anyhow::{Result, bail};
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct CiArgs {
    #[command(subcommand)]
    cmd: CiCommand,
}

#[derive(Subcommand)]
pub enum CiCommand {
    /// Run all CI checks
    All,
    /// Format check (read-only)
    #[command(name = "fmt-check")]
    FmtCheck,
    /// Clippy lints
    Clippy,
    /// Run unit tests only (no features)
    UnitTests,
    /// Run all tests including the Docker-backed ones
    IntegrationTests,
}

pub async fn run(args: CiArgs) -> Result<()> {
    match args.cmd {
        CiCommand::All => run_all().await,
        CiCommand::FmtCheck => run_fmt().await,
        CiCommand::Clippy => run_clippy().await,
        CiCommand::UnitTests => run_unit_tests().await,
        CiCommand::IntegrationTests => run_integration_tests().await,
    }
}

async fn run_all() -> Result<()> {
    println!("Running all CI checks\n");

    println!("Checking code formatting...");
    run_fmt().await?;
    println!("Format check passed\n");

    println!("Running clippy lints...");
    run_clippy().await?;
    println!("Clippy check passed\n");

    println!("Running unit tests (no features)...");
    run_unit_tests().await?;
    println!("Unit tests passed\n");

    println!("Running integration tests (docker-tests)...");
    run_integration_tests().await?;
    println!("Integration tests passed\n");

    println!("All CI checks passed!");
    Ok(())
}

async fn run_fmt() -> Result<()> {
    if !run_cargo(&["fmt", "--all", "--", "--check"]).await? {
        bail!("Format check failed. Run 'cargo fmt --all' to fix.");
    }
    Ok(())
}

async fn run_clippy() -> Result<()> {
    if !run_cargo(&[
        "clippy",
        "--workspace",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ])
    .await?
    {
        bail!("Clippy reported warnings.");
    }
    Ok(())
}

async fn run_unit_tests() -> Result<()> {
    if !run_cargo(&["test", "--workspace"]).await? {
        bail!("Unit tests failed.");
    }
    Ok(())
}

async fn run_integration_tests() -> Result<()> {
    if !run_cargo(&["test", "--workspace", "--features", "docker-tests"]).await? {
        bail!("Integration tests failed.");
    }
    Ok(())
}

pub(crate) async fn run_cargo(args: &[&str]) -> Result<bool> {
    println!("Command: cargo {}", args.join(" "));
    let status = tokio::process::Command::new("cargo")
        .args(args)
        .status()
        .await?;
    Ok(status.success())
}
