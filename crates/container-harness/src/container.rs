//! Container lifecycle wrapper with late-bound base URL resolution.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::docker::{docker, short_id};
use crate::endpoint::{Protocol, ServiceEndpoint};
use crate::logs::forward_logs;
use crate::wait::{WaitFor, await_http_ok, await_log_message, await_port_open};
use crate::{Error, Result};

/// Host under which dynamically published ports are reachable.
const CONTAINER_HOST: &str = "localhost";

/// Default deadline for the readiness wait.
const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(60);

/// Lifecycle state of a [`ContainerHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerState {
    /// Handle exists, nothing launched yet
    Created,
    /// `docker run` issued, readiness condition not yet satisfied
    Starting,
    /// Readiness condition satisfied, port mappings resolved
    Running,
    /// Stopped, or start failed; the handle never becomes usable again
    Stopped,
}

/// Declarative description of a container to launch.
///
/// Exposed ports are published to ephemeral host ports; their order matters
/// because the first one backs [`ContainerHandle::base_url`].
#[derive(Debug, Clone)]
pub struct ContainerSpec {
    image: String,
    name_prefix: String,
    exposed_ports: Vec<u16>,
    env: Vec<(String, String)>,
    network: Option<String>,
    network_alias: Option<String>,
    wait_for: Option<WaitFor>,
    startup_timeout: Duration,
}

impl ContainerSpec {
    /// Describe a container for `image`, identified in logs as `name`.
    pub fn new(image: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            name_prefix: name.into(),
            exposed_ports: Vec::new(),
            env: Vec::new(),
            network: None,
            network_alias: None,
            wait_for: None,
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
        }
    }

    /// Publish internal `port` on an ephemeral host port.
    pub fn with_exposed_port(mut self, port: u16) -> Self {
        self.exposed_ports.push(port);
        self
    }

    /// Set an environment variable inside the container.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Join `network` under `alias`; peer containers on the same network
    /// resolve this container by the alias.
    pub fn with_network(mut self, network: &crate::Network, alias: impl Into<String>) -> Self {
        self.network = Some(network.name().to_string());
        self.network_alias = Some(alias.into());
        self
    }

    /// Readiness condition evaluated during [`ContainerHandle::start`].
    ///
    /// Defaults to waiting for the first exposed port to accept
    /// connections.
    pub fn with_wait_for(mut self, wait: WaitFor) -> Self {
        self.wait_for = Some(wait);
        self
    }

    /// Deadline for the readiness wait.
    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    /// Arguments for `docker run`, detached with ephemeral published ports.
    fn run_args(&self, name: &str) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            "-d".to_string(),
            "--name".to_string(),
            name.to_string(),
        ];
        for port in &self.exposed_ports {
            args.push("-p".to_string());
            args.push(port.to_string());
        }
        for (key, value) in &self.env {
            args.push("-e".to_string());
            args.push(format!("{key}={value}"));
        }
        if let Some(network) = &self.network {
            args.push("--network".to_string());
            args.push(network.clone());
        }
        if let Some(alias) = &self.network_alias {
            args.push("--network-alias".to_string());
            args.push(alias.clone());
        }
        args.push(self.image.clone());
        args
    }
}

/// Handle to one externally orchestrated container.
///
/// Created -> (start succeeds) -> Running -> (stop) -> Stopped, with no
/// way back to Running. A failed start also lands in Stopped.
pub struct ContainerHandle {
    spec: ContainerSpec,
    name: String,
    state: ContainerState,
    container_id: Option<String>,
    mapped_ports: Vec<(u16, u16)>,
    base_url: Option<String>,
    log_task: Option<JoinHandle<()>>,
}

impl ContainerHandle {
    /// Create a handle in the `Created` state. Nothing is launched yet.
    pub fn new(spec: ContainerSpec) -> Self {
        let name = format!("{}-{}", spec.name_prefix, short_id());
        Self {
            spec,
            name,
            state: ContainerState::Created,
            container_id: None,
            mapped_ports: Vec::new(),
            base_url: None,
            log_task: None,
        }
    }

    /// Unique name the container is launched under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ContainerState {
        self.state
    }

    /// True once `start()` succeeded and `stop()` has not run.
    pub fn is_running(&self) -> bool {
        self.state == ContainerState::Running
    }

    /// Launch the container and block until its readiness condition holds.
    ///
    /// On readiness timeout the container is removed again and the handle
    /// lands in `Stopped`; it cannot be restarted.
    pub async fn start(&mut self) -> Result<()> {
        if self.state != ContainerState::Created {
            return Err(Error::AlreadyStarted {
                container: self.name.clone(),
            });
        }
        if self.spec.exposed_ports.is_empty() {
            return Err(Error::InvalidSpec(format!(
                "container '{}' exposes no ports",
                self.name
            )));
        }

        self.state = ContainerState::Starting;
        info!(container = %self.name, image = %self.spec.image, "starting container");

        let args = self.spec.run_args(&self.name);
        let container_id = match docker(&args).await {
            Ok(output) => output.lines().last().unwrap_or_default().to_string(),
            Err(err) => {
                self.state = ContainerState::Stopped;
                return Err(err);
            }
        };
        self.container_id = Some(container_id.clone());

        if let Err(err) = self.resolve_mappings(&container_id).await {
            self.fail_start().await;
            return Err(err);
        }

        if let Err(err) = self.await_ready(&container_id).await {
            warn!(container = %self.name, error = %err, "container never became ready");
            self.fail_start().await;
            return Err(err);
        }

        self.log_task = Some(forward_logs(container_id, self.name.clone()));
        self.state = ContainerState::Running;
        info!(
            container = %self.name,
            mapped_ports = ?self.mapped_ports,
            "container is ready"
        );
        Ok(())
    }

    /// Query the daemon for the host mapping of every exposed port.
    async fn resolve_mappings(&mut self, container_id: &str) -> Result<()> {
        self.mapped_ports.clear();
        let ports = self.spec.exposed_ports.clone();
        for port in ports {
            let port_spec = format!("{port}/tcp");
            let output = docker(&["port", container_id, port_spec.as_str()]).await?;
            let mapped = parse_mapped_port(&output).ok_or(Error::PortNotMapped {
                container: self.name.clone(),
                port,
            })?;
            self.mapped_ports.push((port, mapped));
        }
        Ok(())
    }

    async fn await_ready(&self, container_id: &str) -> Result<()> {
        let deadline = self.spec.startup_timeout;
        let wait = self.spec.wait_for.clone().unwrap_or(WaitFor::Port {
            port: self.spec.exposed_ports[0],
        });

        match wait {
            WaitFor::LogMessage { pattern } => {
                await_log_message(container_id, &self.name, &pattern, deadline).await
            }
            WaitFor::Http { path, port } => {
                let mapped = self.mapping_for(port)?;
                let url = format!("http://{CONTAINER_HOST}:{mapped}{path}");
                await_http_ok(&url, &self.name, deadline).await
            }
            WaitFor::Port { port } => {
                let mapped = self.mapping_for(port)?;
                await_port_open(CONTAINER_HOST, mapped, &self.name, deadline).await
            }
        }
    }

    /// Mapping lookup usable while the handle is still `Starting`.
    fn mapping_for(&self, port: u16) -> Result<u16> {
        self.mapped_ports
            .iter()
            .find(|(internal, _)| *internal == port)
            .map(|(_, mapped)| *mapped)
            .ok_or(Error::PortNotMapped {
                container: self.name.clone(),
                port,
            })
    }

    /// Remove a container whose start did not complete.
    async fn fail_start(&mut self) {
        if let Some(container_id) = self.container_id.take() {
            if let Err(err) = docker(&["rm", "-f", container_id.as_str()]).await {
                warn!(container = %self.name, error = %err, "failed to remove container");
            }
        }
        self.state = ContainerState::Stopped;
    }

    /// Stop and remove the container. Idempotent; safe before `start()`
    /// and after a failed start.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.log_task.take() {
            task.abort();
        }
        self.state = ContainerState::Stopped;

        let Some(container_id) = self.container_id.take() else {
            return Ok(());
        };
        docker(&["rm", "-f", container_id.as_str()]).await?;
        info!(container = %self.name, "stopped container");
        Ok(())
    }

    /// Host port mapped to internal `port`.
    ///
    /// Fails with the illegal-state error unless the container is running.
    pub fn mapped_port(&self, port: u16) -> Result<u16> {
        if !self.is_running() {
            return Err(Error::NotRunning {
                container: self.name.clone(),
            });
        }
        self.mapping_for(port)
    }

    /// Resolved endpoint for the first exposed port.
    pub fn endpoint(&self, protocol: Protocol) -> Result<ServiceEndpoint> {
        if !self.is_running() {
            return Err(Error::NotRunning {
                container: self.name.clone(),
            });
        }
        let (_, mapped) = self.mapped_ports.first().ok_or(Error::PortNotMapped {
            container: self.name.clone(),
            port: 0,
        })?;
        Ok(ServiceEndpoint {
            protocol,
            host: CONTAINER_HOST.to_string(),
            port: *mapped,
        })
    }

    /// Base URL for the first exposed port's host mapping.
    ///
    /// Fails with the illegal-state error unless the container is running;
    /// once computed the value is cached for the rest of the running
    /// lifetime.
    pub fn base_url(&mut self, protocol: Protocol) -> Result<String> {
        if !self.is_running() {
            return Err(Error::NotRunning {
                container: self.name.clone(),
            });
        }
        if let Some(url) = &self.base_url {
            return Ok(url.clone());
        }
        let url = self.endpoint(protocol)?.base_url();
        info!(container = %self.name, url = %url, "resolved base URL");
        self.base_url = Some(url.clone());
        Ok(url)
    }

    /// Base URL with `path_prefix` appended, ready to hand to a client
    /// factory.
    ///
    /// Fails with the same illegal-state error as [`Self::base_url`] when
    /// the container is not running.
    pub fn client_base(&mut self, protocol: Protocol, path_prefix: &str) -> Result<String> {
        Ok(format!("{}{}", self.base_url(protocol)?, path_prefix))
    }
}

impl Drop for ContainerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.log_task.take() {
            task.abort();
        }
        if let Some(container_id) = self.container_id.take() {
            warn!(container = %self.name, "container leaked, force-removing");
            std::process::Command::new("docker")
                .args(["rm", "-f", container_id.as_str()])
                .output()
                .ok();
        }
    }
}

/// Parse `docker port` output such as `0.0.0.0:49153` (possibly followed
/// by an IPv6 line) into the host port.
fn parse_mapped_port(output: &str) -> Option<u16> {
    let line = output.lines().next()?;
    line.rsplit_once(':')?.1.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> ContainerSpec {
        ContainerSpec::new("inventory:1.0-SNAPSHOT", "inventory")
            .with_exposed_port(9443)
            .with_exposed_port(9080)
            .with_env("POSTGRES_HOSTNAME", "postgres")
    }

    #[test]
    fn run_args_preserve_port_order_and_env() {
        let args = spec().run_args("inventory-abc123");
        assert_eq!(
            args,
            vec![
                "run",
                "-d",
                "--name",
                "inventory-abc123",
                "-p",
                "9443",
                "-p",
                "9080",
                "-e",
                "POSTGRES_HOSTNAME=postgres",
                "inventory:1.0-SNAPSHOT",
            ]
        );
    }

    #[test]
    fn parse_mapped_port_handles_dual_stack_output() {
        assert_eq!(parse_mapped_port("0.0.0.0:49153"), Some(49153));
        assert_eq!(parse_mapped_port("0.0.0.0:49153\n[::]:49154"), Some(49153));
        assert_eq!(parse_mapped_port(""), None);
        assert_eq!(parse_mapped_port("garbage"), None);
    }

    #[test]
    fn base_url_before_start_is_an_illegal_state() {
        let mut handle = ContainerHandle::new(spec());
        assert_eq!(handle.state(), ContainerState::Created);
        let err = handle.base_url(Protocol::Https).unwrap_err();
        assert!(matches!(err, Error::NotRunning { .. }));
        assert!(err.to_string().contains("must be running"));
    }

    #[tokio::test]
    async fn stop_before_start_is_idempotent() {
        let mut handle = ContainerHandle::new(spec());
        handle.stop().await.unwrap();
        handle.stop().await.unwrap();
        assert_eq!(handle.state(), ContainerState::Stopped);
    }

    #[tokio::test]
    async fn base_url_after_stop_stays_illegal() {
        let mut handle = ContainerHandle::new(spec());
        handle.stop().await.unwrap();
        let err = handle.base_url(Protocol::Http).unwrap_err();
        assert!(matches!(err, Error::NotRunning { .. }));
    }

    #[test]
    fn client_base_shares_the_illegal_state_check() {
        let mut handle = ContainerHandle::new(spec());
        let err = handle.client_base(Protocol::Https, "/inventory/api").unwrap_err();
        assert!(matches!(err, Error::NotRunning { .. }));
    }

    #[tokio::test]
    async fn mapped_port_requires_running_state() {
        let handle = ContainerHandle::new(spec());
        assert!(matches!(
            handle.mapped_port(9080),
            Err(Error::NotRunning { .. })
        ));
    }

    #[test]
    fn handles_get_unique_names() {
        let a = ContainerHandle::new(spec());
        let b = ContainerHandle::new(spec());
        assert_ne!(a.name(), b.name());
        assert!(a.name().starts_with("inventory-"));
    }
}
