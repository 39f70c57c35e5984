//! # Inventory Client
//!
//! Typed REST client for the inventory service under test.
//!
//! Each client method maps one-to-one to a remote CRUD operation under the
//! service's API root. In https mode the transport is built from
//! [`TrustMaterial`] and accepts the self-signed certificates a local test
//! run generates; that relaxation is scoped to the one client built from
//! it and never becomes a process-wide default.

#![warn(missing_docs)]

mod client;
mod models;
mod tls;

pub use client::SystemResourceClient;
pub use models::SystemData;
pub use tls::TrustMaterial;

/// Error types for client operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Transport-level failure (connect, TLS handshake, body decode)
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote operation answered with a non-success status
    #[error("{operation} returned unexpected status {status}")]
    UnexpectedStatus {
        /// Logical operation name
        operation: &'static str,
        /// Status code received
        status: reqwest::StatusCode,
    },

    /// Keystore file could not be read
    #[error("failed to read keystore {path}: {source}")]
    Keystore {
        /// Path that was attempted
        path: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Client TLS configuration could not be built
    #[error("TLS configuration error: {0}")]
    Tls(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
