//! Test-run configuration read from the process environment.

use std::path::PathBuf;
use std::time::Duration;

use container_harness::Protocol;
use thiserror::Error;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A numeric variable did not parse as a port
    #[error("invalid value '{value}' for {name}: expected a port number")]
    InvalidPort {
        /// Variable name
        name: &'static str,
        /// Offending value
        value: String,
    },

    /// The protocol variable is neither http nor https
    #[error("invalid value '{0}' for TEST_PROTOCOL, expected 'http' or 'https'")]
    InvalidProtocol(String),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Settings for one smoke-test run.
///
/// Every field has a default matching the service's build setup, so a run
/// against the stock images needs no environment at all.
#[derive(Debug, Clone)]
pub struct SmokeConfig {
    /// Protocol the service is exercised over
    pub protocol: Protocol,
    /// Plaintext service port
    pub http_port: u16,
    /// TLS service port
    pub https_port: u16,
    /// Application context root; the API root is `{context_root}/api`
    pub context_root: String,
    /// Image of the service under test
    pub app_image: String,
    /// Image of the backing database
    pub postgres_image: String,
    /// Port the database listens on
    pub postgres_port: u16,
    /// Network alias the database is reachable under from the service
    pub postgres_host: String,
    /// PKCS#12 keystore path for https runs
    pub keystore_path: PathBuf,
    /// Keystore passphrase
    pub keystore_passphrase: String,
    /// Container startup deadline
    pub startup_timeout: Duration,
}

impl SmokeConfig {
    /// Read configuration from the environment.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            protocol: parse_protocol(env_or("TEST_PROTOCOL", "https"))?,
            http_port: parse_port("HTTP_PORT", env_or("HTTP_PORT", "9080"))?,
            https_port: parse_port("HTTPS_PORT", env_or("HTTPS_PORT", "9443"))?,
            context_root: std::env::var("CONTEXT_ROOT").unwrap_or_default(),
            app_image: env_or("APP_IMAGE", "inventory:1.0-SNAPSHOT"),
            postgres_image: env_or("POSTGRES_IMAGE", "postgres-sample:latest"),
            postgres_port: parse_port("POSTGRES_PORT", env_or("POSTGRES_PORT", "5432"))?,
            postgres_host: "postgres".to_string(),
            keystore_path: PathBuf::from(env_or(
                "KEYSTORE_PATH",
                "src/main/liberty/config/resources/security/key.p12",
            )),
            keystore_passphrase: env_or("KEYSTORE_PASSPHRASE", "secret"),
            startup_timeout: Duration::from_secs(60),
        })
    }

    /// Path prefix the client appends to the base URL.
    pub fn app_path(&self) -> String {
        format!("{}/api", self.context_root)
    }

    /// Port the scenarios are served on for the configured protocol.
    pub fn service_port(&self) -> u16 {
        match self.protocol {
            Protocol::Http => self.http_port,
            Protocol::Https => self.https_port,
        }
    }

    /// True when the run exercises the service over TLS.
    pub fn tls(&self) -> bool {
        self.protocol == Protocol::Https
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_protocol(value: String) -> Result<Protocol> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidProtocol(value))
}

fn parse_port(name: &'static str, value: String) -> Result<u16> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidPort { name, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ports_parse_or_report_the_variable() {
        assert_eq!(parse_port("HTTP_PORT", "9080".to_string()).unwrap(), 9080);

        let err = parse_port("HTTP_PORT", "ninety-eighty".to_string()).unwrap_err();
        assert!(err.to_string().contains("HTTP_PORT"));
        assert!(err.to_string().contains("ninety-eighty"));
    }

    #[test]
    fn protocol_defaults_to_https_and_rejects_junk() {
        assert_eq!(
            parse_protocol("https".to_string()).unwrap(),
            Protocol::Https
        );
        assert_eq!(parse_protocol("HTTP".to_string()).unwrap(), Protocol::Http);
        assert!(parse_protocol("spdy".to_string()).is_err());
    }

    #[test]
    fn app_path_appends_api_to_the_context_root() {
        let mut config = SmokeConfig::from_env().unwrap();
        config.context_root = "/inventory".to_string();
        assert_eq!(config.app_path(), "/inventory/api");

        config.context_root = String::new();
        assert_eq!(config.app_path(), "/api");
    }

    #[test]
    fn service_port_follows_the_protocol() {
        let mut config = SmokeConfig::from_env().unwrap();
        config.http_port = 9080;
        config.https_port = 9443;

        config.protocol = Protocol::Http;
        assert_eq!(config.service_port(), 9080);
        assert!(!config.tls());

        config.protocol = Protocol::Https;
        assert_eq!(config.service_port(), 9443);
        assert!(config.tls());
    }
}
