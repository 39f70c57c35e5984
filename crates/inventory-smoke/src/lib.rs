//! # Inventory Smoke
//!
//! Ordered CRUD smoke scenarios for the inventory service.
//!
//! One run is: decide whether to test a locally managed runtime or freshly
//! launched containers, start whatever is missing (PostgreSQL first, the
//! service second, joined over a shared network), build a single REST
//! client, execute the scenarios in declared order, and tear everything
//! down regardless of outcome.
//!
//! ## Example
//!
//! ```no_run
//! use inventory_smoke::{SmokeConfig, SmokeSuite};
//!
//! # async fn example() -> inventory_smoke::Result<()> {
//! let config = SmokeConfig::from_env()?;
//! SmokeSuite::new(config).run().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod scenarios;
mod suite;

pub use config::{ConfigError, SmokeConfig};
pub use container_harness::Protocol;
pub use suite::{SmokeSuite, TestMode, decide_mode};

/// Error types for a smoke-test run
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Local service is running but its database dependency is not
    #[error("Postgres database is not running")]
    DatabaseNotRunning,

    /// A locally running database would conflict with the containers
    /// about to be started
    #[error("Postgres database is running locally. Stop it and retry.")]
    DatabaseConflict,

    /// Scenario batch requested before setup completed
    #[error("suite is not set up; call setup() first")]
    NotSetUp,

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Container lifecycle error
    #[error("container error: {0}")]
    Container(#[from] container_harness::Error),

    /// REST client error
    #[error("client error: {0}")]
    Client(#[from] inventory_client::Error),

    /// A scenario failed; later scenarios in the batch were skipped
    #[error("scenario '{name}' failed: {source}")]
    Scenario {
        /// Scenario name
        name: &'static str,
        /// Failure reported by the scenario body
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
