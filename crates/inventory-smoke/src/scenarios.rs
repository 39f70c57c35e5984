//! The ordered CRUD scenarios.
//!
//! Ordering is significant: `add_system` seeds the single record that
//! `update_system` rewrites and `remove_system` deletes. The suite runs
//! them in exactly this order and stops at the first failure.

use anyhow::{Result, ensure};
use inventory_client::{SystemData, SystemResourceClient};
use tracing::info;

fn show_system_data(system: &SystemData) {
    info!(
        id = ?system.id,
        hostname = %system.hostname,
        os_name = %system.os_name,
        java_version = %system.java_version,
        heap_size = system.heap_size,
        "system record"
    );
}

/// Add one record, then verify the listing contains exactly that record.
pub async fn add_system(client: &SystemResourceClient) -> Result<()> {
    client.add_system("localhost", "linux", "11", 2048).await?;

    let systems = client.list_contents().await?;
    ensure!(
        systems.len() == 1,
        "expected exactly one record after add, found {}",
        systems.len()
    );
    show_system_data(&systems[0]);
    ensure!(
        systems[0].java_version == "11",
        "javaVersion was '{}'",
        systems[0].java_version
    );
    ensure!(
        systems[0].heap_size == 2048,
        "heapSize was {}",
        systems[0].heap_size
    );
    Ok(())
}

/// Rewrite the record added before and fetch it back.
pub async fn update_system(client: &SystemResourceClient) -> Result<()> {
    client.update_system("localhost", "linux", "8", 1024).await?;

    let system = client.get_system("localhost").await?;
    show_system_data(&system);
    ensure!(
        system.java_version == "8",
        "javaVersion was '{}'",
        system.java_version
    );
    ensure!(system.heap_size == 1024, "heapSize was {}", system.heap_size);
    Ok(())
}

/// Remove the record and verify the listing is empty again.
pub async fn remove_system(client: &SystemResourceClient) -> Result<()> {
    client.remove_system("localhost").await?;

    let systems = client.list_contents().await?;
    ensure!(
        systems.is_empty(),
        "expected an empty listing after remove, found {} records",
        systems.len()
    );
    Ok(())
}
