//! Resolved service endpoints.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// URL scheme a service is exercised over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Plaintext HTTP
    Http,
    /// HTTP over TLS
    Https,
}

impl Protocol {
    /// Scheme string as it appears in a URL.
    pub fn scheme(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Protocol::Http),
            "https" => Ok(Protocol::Https),
            other => Err(Error::UnknownProtocol(other.to_string())),
        }
    }
}

/// Externally reachable endpoint of a started container.
///
/// The port is the dynamically assigned host mapping, only known once the
/// underlying process is confirmed running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    /// URL scheme
    pub protocol: Protocol,
    /// Host the mapping is published on
    pub host: String,
    /// Dynamically mapped host port
    pub port: u16,
}

impl ServiceEndpoint {
    /// Derived base URL: `protocol://host:port`.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_exact_concatenation() {
        let endpoint = ServiceEndpoint {
            protocol: Protocol::Https,
            host: "localhost".to_string(),
            port: 49153,
        };
        assert_eq!(endpoint.base_url(), "https://localhost:49153");

        let endpoint = ServiceEndpoint {
            protocol: Protocol::Http,
            host: "docker".to_string(),
            port: 1,
        };
        assert_eq!(endpoint.base_url(), "http://docker:1");
    }

    #[test]
    fn protocol_parses_case_insensitively() {
        assert_eq!("http".parse::<Protocol>().unwrap(), Protocol::Http);
        assert_eq!("HTTPS".parse::<Protocol>().unwrap(), Protocol::Https);
        assert!("ftp".parse::<Protocol>().is_err());
    }

    #[test]
    fn protocol_serializes_as_scheme() {
        assert_eq!(serde_json::to_string(&Protocol::Https).unwrap(), "\"https\"");
        assert_eq!(
            serde_json::from_str::<Protocol>("\"http\"").unwrap(),
            Protocol::Http
        );
    }
}
