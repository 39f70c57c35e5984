//! Orchestration of one smoke-test run.

use std::future::Future;

use container_harness::{
    ContainerHandle, ContainerSpec, Network, WaitFor, is_reachable,
};
use inventory_client::{SystemResourceClient, TrustMaterial};
use tracing::{info, warn};

use crate::config::SmokeConfig;
use crate::scenarios;
use crate::{Error, Result};

/// Where the service under test comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestMode {
    /// An externally managed instance already listens on the local ports
    Local,
    /// The suite launches the service and database containers itself
    Containers,
}

/// Decide the test mode from the two local reachability observations.
///
/// An open service port is taken to mean the right service is listening;
/// the probe makes no stronger check than that.
pub fn decide_mode(service_up: bool, database_up: bool) -> Result<TestMode> {
    match (service_up, database_up) {
        (true, true) => Ok(TestMode::Local),
        (true, false) => Err(Error::DatabaseNotRunning),
        (false, true) => Err(Error::DatabaseConflict),
        (false, false) => Ok(TestMode::Containers),
    }
}

/// One smoke-test run: setup, the ordered scenario batch, teardown.
///
/// Every resource the suite acquires is stored on the suite before it is
/// started, so [`SmokeSuite::teardown`] releases whatever exists even when
/// setup only partially completed.
pub struct SmokeSuite {
    config: SmokeConfig,
    mode: Option<TestMode>,
    network: Option<Network>,
    postgres: Option<ContainerHandle>,
    inventory: Option<ContainerHandle>,
    client: Option<SystemResourceClient>,
    api_root: Option<String>,
}

impl SmokeSuite {
    /// Create a suite that has acquired nothing yet.
    pub fn new(config: SmokeConfig) -> Self {
        Self {
            config,
            mode: None,
            network: None,
            postgres: None,
            inventory: None,
            client: None,
            api_root: None,
        }
    }

    /// Chosen mode, once setup has run.
    pub fn mode(&self) -> Option<TestMode> {
        self.mode
    }

    /// Resolved API root, once setup has run.
    pub fn api_root(&self) -> Option<&str> {
        self.api_root.as_deref()
    }

    /// Decide local-vs-container mode, start whatever is missing, and
    /// build the one shared client for the batch.
    pub async fn setup(&mut self) -> Result<()> {
        let service_up = is_reachable("localhost", self.config.http_port).await;
        let database_up = is_reachable("localhost", self.config.postgres_port).await;
        let mode = decide_mode(service_up, database_up)?;
        self.mode = Some(mode);

        let api_root = match mode {
            TestMode::Local => {
                info!("testing against a locally managed runtime");
                format!(
                    "{}://localhost:{}{}",
                    self.config.protocol,
                    self.config.service_port(),
                    self.config.app_path()
                )
            }
            TestMode::Containers => {
                info!("testing with freshly launched containers");
                self.start_containers().await?
            }
        };
        info!(url = %api_root, "API root resolved");

        let trust = if self.config.tls() {
            Some(TrustMaterial::load(
                &self.config.keystore_path,
                &self.config.keystore_passphrase,
            )?)
        } else {
            None
        };
        self.client = Some(SystemResourceClient::build(&api_root, trust.as_ref())?);
        self.api_root = Some(api_root);
        Ok(())
    }

    /// Start the database, then the service, and resolve the API root
    /// from the service handle.
    async fn start_containers(&mut self) -> Result<String> {
        let network = Network::create("inventory-smoke").await?;

        let postgres_spec = ContainerSpec::new(&self.config.postgres_image, "postgres")
            .with_exposed_port(self.config.postgres_port)
            .with_network(&network, &self.config.postgres_host)
            .with_wait_for(WaitFor::log_message(
                "database system is ready to accept connections",
            ))
            .with_startup_timeout(self.config.startup_timeout);

        let mut inventory_spec = ContainerSpec::new(&self.config.app_image, "inventory")
            .with_env("POSTGRES_HOSTNAME", &self.config.postgres_host)
            .with_network(&network, "inventory")
            .with_wait_for(WaitFor::http(
                format!("{}/systems", self.config.app_path()),
                self.config.http_port,
            ))
            .with_startup_timeout(self.config.startup_timeout);
        if self.config.tls() {
            // TLS port first so the first mapping backs the https base URL.
            inventory_spec = inventory_spec.with_exposed_port(self.config.https_port);
        }
        inventory_spec = inventory_spec.with_exposed_port(self.config.http_port);

        self.network = Some(network);

        let postgres = self.postgres.insert(ContainerHandle::new(postgres_spec));
        postgres.start().await?;

        let inventory = self.inventory.insert(ContainerHandle::new(inventory_spec));
        inventory.start().await?;
        Ok(inventory.client_base(self.config.protocol, &self.config.app_path())?)
    }

    /// Run the ordered scenario batch against the shared client.
    ///
    /// The first failing scenario fails the run and skips the rest of the
    /// batch, since later scenarios depend on the state it would leave.
    pub async fn run_scenarios(&self) -> Result<()> {
        let client = self.client.as_ref().ok_or(Error::NotSetUp)?;
        run_scenario("add_system", scenarios::add_system(client)).await?;
        run_scenario("update_system", scenarios::update_system(client)).await?;
        run_scenario("remove_system", scenarios::remove_system(client)).await?;
        Ok(())
    }

    /// Execute the full run: setup, scenarios, unconditional teardown.
    pub async fn run(mut self) -> Result<()> {
        let result = async {
            self.setup().await?;
            self.run_scenarios().await
        }
        .await;
        self.teardown().await;
        result
    }

    /// Stop the service container, then the database container, then
    /// release the shared network.
    ///
    /// Runs after failures as well; every release is attempted even when
    /// an earlier one reports an error.
    pub async fn teardown(&mut self) {
        if let Some(mut inventory) = self.inventory.take() {
            if let Err(err) = inventory.stop().await {
                warn!(error = %err, "failed to stop the inventory container");
            }
        }
        if let Some(mut postgres) = self.postgres.take() {
            if let Err(err) = postgres.stop().await {
                warn!(error = %err, "failed to stop the postgres container");
            }
        }
        if let Some(mut network) = self.network.take() {
            if let Err(err) = network.release().await {
                warn!(error = %err, "failed to release the test network");
            }
        }
        self.client = None;
    }
}

async fn run_scenario(
    name: &'static str,
    scenario: impl Future<Output = anyhow::Result<()>>,
) -> Result<()> {
    info!(scenario = name, "running scenario");
    scenario.await.map_err(|source| Error::Scenario {
        name,
        source: source.into(),
    })?;
    info!(scenario = name, "scenario passed");
    Ok(())
}
