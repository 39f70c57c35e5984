//! Typed client for the inventory service's REST contract.

use reqwest::{Client, Response};
use tracing::debug;

use crate::models::SystemData;
use crate::tls::TrustMaterial;
use crate::{Error, Result};

/// Typed client for the inventory CRUD operations.
///
/// Each method is one HTTP call against the API root given at build time.
/// No client-side retries and no timeout beyond the transport default; a
/// non-success status or connection failure surfaces as this operation's
/// error.
pub struct SystemResourceClient {
    http: Client,
    base_url: String,
}

impl SystemResourceClient {
    /// Build a client against `base_url`, with scheme, host, port, and API
    /// path prefix already joined, e.g. `https://localhost:49153/inventory/api`.
    ///
    /// With `trust` supplied the transport accepts any server certificate
    /// chain; the relaxation applies to this client instance only.
    pub fn build(base_url: impl Into<String>, trust: Option<&TrustMaterial>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(trust) = trust {
            builder = builder.use_preconfigured_tls(trust.client_config()?);
        }
        let http = builder.build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(base_url = %base_url, "built inventory client");
        Ok(Self { http, base_url })
    }

    /// API root this client was built against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn systems_url(&self) -> String {
        format!("{}/systems", self.base_url)
    }

    fn system_url(&self, hostname: &str) -> String {
        format!("{}/systems/{hostname}", self.base_url)
    }

    /// Register a new system record.
    pub async fn add_system(
        &self,
        hostname: &str,
        os_name: &str,
        java_version: &str,
        heap_size: i64,
    ) -> Result<()> {
        debug!(hostname, "adding system");
        let heap_size = heap_size.to_string();
        let response = self
            .http
            .post(self.systems_url())
            .query(&[
                ("hostname", hostname),
                ("osName", os_name),
                ("javaVersion", java_version),
                ("heapSize", heap_size.as_str()),
            ])
            .send()
            .await?;
        expect_success("addSystem", response)?;
        Ok(())
    }

    /// Rewrite the record stored for `hostname`.
    pub async fn update_system(
        &self,
        hostname: &str,
        os_name: &str,
        java_version: &str,
        heap_size: i64,
    ) -> Result<()> {
        debug!(hostname, "updating system");
        let heap_size = heap_size.to_string();
        let response = self
            .http
            .put(self.system_url(hostname))
            .query(&[
                ("osName", os_name),
                ("javaVersion", java_version),
                ("heapSize", heap_size.as_str()),
            ])
            .send()
            .await?;
        expect_success("updateSystem", response)?;
        Ok(())
    }

    /// Fetch the record stored for `hostname`.
    pub async fn get_system(&self, hostname: &str) -> Result<SystemData> {
        debug!(hostname, "fetching system");
        let response = self.http.get(self.system_url(hostname)).send().await?;
        let response = expect_success("getSystem", response)?;
        Ok(response.json().await?)
    }

    /// Delete the record stored for `hostname`.
    pub async fn remove_system(&self, hostname: &str) -> Result<()> {
        debug!(hostname, "removing system");
        let response = self.http.delete(self.system_url(hostname)).send().await?;
        expect_success("removeSystem", response)?;
        Ok(())
    }

    /// List every stored record.
    pub async fn list_contents(&self) -> Result<Vec<SystemData>> {
        debug!("listing inventory contents");
        let response = self.http.get(self.systems_url()).send().await?;
        let response = expect_success("listContents", response)?;
        Ok(response.json().await?)
    }
}

fn expect_success(operation: &'static str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(Error::UnexpectedStatus { operation, status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized_without_a_trailing_slash() {
        let client = SystemResourceClient::build("http://localhost:9080/inventory/api/", None)
            .unwrap();
        assert_eq!(client.base_url(), "http://localhost:9080/inventory/api");
        assert_eq!(
            client.systems_url(),
            "http://localhost:9080/inventory/api/systems"
        );
        assert_eq!(
            client.system_url("localhost"),
            "http://localhost:9080/inventory/api/systems/localhost"
        );
    }
}
