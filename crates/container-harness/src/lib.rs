//! # Container Harness
//!
//! Container lifecycle management for integration tests.
//!
//! This crate launches service dependencies in ephemeral Docker containers,
//! waits for a readiness condition (log marker, HTTP success, or an open
//! port), and resolves externally reachable base URLs from the dynamically
//! mapped host ports.
//!
//! ## Example
//!
//! ```no_run
//! use container_harness::{ContainerHandle, ContainerSpec, Protocol, WaitFor};
//!
//! # async fn example() -> container_harness::Result<()> {
//! let spec = ContainerSpec::new("postgres-sample:latest", "postgres")
//!     .with_exposed_port(5432)
//!     .with_env("POSTGRES_PASSWORD", "admin123")
//!     .with_wait_for(WaitFor::log_message(
//!         "database system is ready to accept connections",
//!     ));
//!
//! let mut postgres = ContainerHandle::new(spec);
//! postgres.start().await?;
//! let url = postgres.base_url(Protocol::Http)?;
//! postgres.stop().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod container;
mod docker;
mod endpoint;
mod logs;
mod probe;
mod wait;

pub use container::{ContainerHandle, ContainerSpec, ContainerState};
pub use docker::Network;
pub use endpoint::{Protocol, ServiceEndpoint};
pub use probe::is_reachable;
pub use wait::WaitFor;

/// Error types for container operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Base URL or port mapping queried while the container is not running
    #[error("container '{container}' must be running to determine hostname and port")]
    NotRunning {
        /// Container name
        container: String,
    },

    /// start() called on a handle that already left the Created state
    #[error("container '{container}' was already started")]
    AlreadyStarted {
        /// Container name
        container: String,
    },

    /// Readiness condition not satisfied within the startup timeout
    #[error(
        "container '{container}' did not become ready within {elapsed:?}; \
         last observed state: {last_state}"
    )]
    StartupTimeout {
        /// Container name
        container: String,
        /// Time spent waiting
        elapsed: std::time::Duration,
        /// Last log line or HTTP state seen before giving up
        last_state: String,
    },

    /// A docker CLI invocation failed
    #[error("docker command failed: `{command}`: {message}")]
    Docker {
        /// The docker subcommand that was run
        command: String,
        /// Captured stderr (or stdout when stderr is empty)
        message: String,
    },

    /// No host mapping exists for an internal container port
    #[error("no host port mapped for container '{container}' port {port}")]
    PortNotMapped {
        /// Container name
        container: String,
        /// Internal port that was queried
        port: u16,
    },

    /// Container description is unusable
    #[error("invalid container spec: {0}")]
    InvalidSpec(String),

    /// Readiness log pattern failed to compile
    #[error("invalid readiness pattern: {0}")]
    InvalidWaitPattern(#[from] regex::Error),

    /// Protocol name is neither http nor https
    #[error("unknown protocol '{0}', expected 'http' or 'https'")]
    UnknownProtocol(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
