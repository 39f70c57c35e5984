//! Transport trust for clients talking to locally issued certificates.

use std::path::Path;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};

use crate::{Error, Result};

/// Keystore material used to build a test client's trust context.
///
/// The keystore is a local PKCS#12 blob with a fixed passphrase, loaded
/// once at setup. It is never transmitted and never validated against a
/// certificate authority. The service under test does not request client
/// certificates, so the blob's presence gates https setup while the actual
/// trust relaxation comes from [`TrustMaterial::client_config`].
#[derive(Debug)]
pub struct TrustMaterial {
    keystore: Vec<u8>,
    passphrase: String,
}

impl TrustMaterial {
    /// Load the keystore blob from `path`.
    pub fn load(path: impl AsRef<Path>, passphrase: impl Into<String>) -> Result<Self> {
        let keystore = std::fs::read(path.as_ref()).map_err(|source| Error::Keystore {
            path: path.as_ref().display().to_string(),
            source,
        })?;
        Ok(Self {
            keystore,
            passphrase: passphrase.into(),
        })
    }

    /// Raw keystore bytes.
    pub fn keystore(&self) -> &[u8] {
        &self.keystore
    }

    /// Keystore passphrase.
    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    /// Client TLS configuration that accepts any server certificate chain.
    ///
    /// The ephemeral certificates of a local test run are self-signed and
    /// their subject never matches the host used at test time, so both
    /// chain validation and hostname verification are skipped. The
    /// configuration applies only to the client it is handed to.
    pub(crate) fn client_config(&self) -> Result<ClientConfig> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|err| Error::Tls(err.to_string()))?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert))
            .with_no_client_auth();
        Ok(config)
    }
}

/// Certificate verifier that accepts any chain. Test transport only.
#[derive(Debug)]
pub(crate) struct AcceptAnyServerCert;

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        rustls::crypto::ring::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_keystore_bytes_and_passphrase() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not-a-real-p12").unwrap();

        let trust = TrustMaterial::load(file.path(), "secret").unwrap();
        assert_eq!(trust.keystore(), b"not-a-real-p12");
        assert_eq!(trust.passphrase(), "secret");
    }

    #[test]
    fn missing_keystore_is_a_keystore_error() {
        let err = TrustMaterial::load("/does/not/exist/key.p12", "secret").unwrap_err();
        match err {
            Error::Keystore { path, .. } => assert!(path.ends_with("key.p12")),
            other => panic!("expected Keystore error, got {other:?}"),
        }
    }

    #[test]
    fn verifier_accepts_an_arbitrary_self_signed_certificate() {
        let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        let der = cert.cert.der().clone();

        let verifier = AcceptAnyServerCert;
        // The name deliberately does not match the certificate subject.
        let name = ServerName::try_from("inventory.internal").unwrap();
        let verdict = verifier.verify_server_cert(&der, &[], &name, &[], UnixTime::now());
        assert!(verdict.is_ok());
    }

    #[test]
    fn client_config_builds_without_roots() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"keystore").unwrap();
        let trust = TrustMaterial::load(file.path(), "secret").unwrap();
        assert!(trust.client_config().is_ok());
    }
}
