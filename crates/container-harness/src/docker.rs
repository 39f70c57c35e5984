//! Thin wrapper around the `docker` command line client.

use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{Error, Result};

/// Run a `docker` subcommand and return its trimmed stdout.
///
/// A non-zero exit status becomes [`Error::Docker`] carrying the captured
/// stderr.
pub(crate) async fn docker<S: AsRef<str>>(args: &[S]) -> Result<String> {
    let rendered = args
        .iter()
        .map(AsRef::<str>::as_ref)
        .collect::<Vec<_>>()
        .join(" ");
    debug!(command = %format!("docker {rendered}"), "running docker command");

    let output = Command::new("docker")
        .args(args.iter().map(AsRef::<str>::as_ref))
        .stdin(Stdio::null())
        .output()
        .await?;

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(Error::Docker {
            command: rendered,
            message: if stderr.is_empty() { stdout } else { stderr },
        });
    }
    Ok(stdout)
}

/// Snapshot of a container's combined log stream.
///
/// `docker logs` replays container stdout and stderr on the matching host
/// streams; readiness markers can appear on either, so both are captured.
pub(crate) async fn docker_logs(container_id: &str) -> Result<String> {
    let output = Command::new("docker")
        .args(["logs", container_id])
        .stdin(Stdio::null())
        .output()
        .await?;

    if !output.status.success() {
        return Err(Error::Docker {
            command: format!("logs {container_id}"),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let mut logs = String::from_utf8_lossy(&output.stdout).into_owned();
    logs.push_str(&String::from_utf8_lossy(&output.stderr));
    Ok(logs)
}

/// Short unique suffix for container and network names.
pub(crate) fn short_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    id[..8].to_string()
}

/// A shared bridge network that containers under test join.
///
/// The network gets a unique suffixed name so concurrent test runs on the
/// same daemon do not collide. Dropping an unreleased network removes it
/// synchronously as a backstop against leaks from panicking test runs.
pub struct Network {
    name: String,
    released: bool,
}

impl Network {
    /// Create a new uniquely named bridge network.
    pub async fn create(prefix: &str) -> Result<Self> {
        let name = format!("{}-{}", prefix, short_id());
        docker(&["network", "create", name.as_str()]).await?;
        info!(network = %name, "created test network");
        Ok(Self {
            name,
            released: false,
        })
    }

    /// Network name, as passed to `docker run --network`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Remove the network. Idempotent.
    ///
    /// Removal fails while containers are still attached; the error is
    /// surfaced so teardown ordering bugs show up in test output.
    pub async fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        docker(&["network", "rm", self.name.as_str()]).await?;
        info!(network = %self.name, "released test network");
        Ok(())
    }
}

impl Drop for Network {
    fn drop(&mut self) {
        if !self.released {
            warn!(network = %self.name, "network leaked, removing");
            std::process::Command::new("docker")
                .args(["network", "rm", self.name.as_str()])
                .output()
                .ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_ids_are_short_and_unique() {
        let a = short_id();
        let b = short_id();
        assert_eq!(a.len(), 8);
        assert_ne!(a, b);
    }
}
