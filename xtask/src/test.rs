use anyhow::{Result, bail};
use clap::Args;

use crate::ci::run_cargo;

#[derive(Args)]
pub struct TestArgs {
    /// Package to test
    #[arg(short, long)]
    package: Option<String>,

    /// Features to enable (e.g. docker-tests)
    #[arg(short, long)]
    features: Option<String>,

    /// Test name filter
    filter: Option<String>,
}

pub async fn run(args: TestArgs) -> Result<()> {
    println!("Running tests\n");

    let mut cmd_args = vec!["test"];

    if let Some(package) = &args.package {
        cmd_args.push("-p");
        cmd_args.push(package);
    } else {
        cmd_args.push("--workspace");
    }

    if let Some(features) = &args.features {
        cmd_args.push("--features");
        cmd_args.push(features);
    }

    cmd_args.push("--");
    if let Some(filter) = &args.filter {
        cmd_args.push(filter);
    }
    cmd_args.push("--nocapture");

    if !run_cargo(&cmd_args).await? {
        bail!("Tests failed.");
    }
    Ok(())
}
