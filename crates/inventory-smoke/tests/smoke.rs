//! End-to-end smoke run against real containers.
//!
//! Run with `cargo test -p inventory-smoke --features docker-tests`.
//! Requires a Docker daemon plus the `inventory:1.0-SNAPSHOT` and
//! `postgres-sample:latest` images from the service's build.

#![cfg(feature = "docker-tests")]

use anyhow::{Context, Result};
use container_harness::is_reachable;
use inventory_smoke::{SmokeConfig, SmokeSuite, TestMode};

/// Host port out of an API root such as `https://localhost:49153/api`.
fn port_of(api_root: &str) -> Result<u16> {
    let (_, rest) = api_root.rsplit_once(':').context("no port in URL")?;
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().context("port did not parse")
}

#[tokio::test]
async fn ordered_crud_scenarios_pass_and_release_resources() -> Result<()> {
    let config = SmokeConfig::from_env()?;
    let mut suite = SmokeSuite::new(config);

    suite.setup().await?;
    let mode = suite.mode();
    let api_root = suite.api_root().map(str::to_string);

    let result = suite.run_scenarios().await;
    suite.teardown().await;
    result?;

    // With containers, teardown must leave no reachable port behind.
    if mode == Some(TestMode::Containers) {
        let api_root = api_root.context("setup resolved no API root")?;
        let port = port_of(&api_root)?;
        assert!(
            !is_reachable("localhost", port).await,
            "service port {port} still reachable after teardown"
        );
    }
    Ok(())
}
