//! Health probe over TLS, pinned to the provisioned certificate.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{CertificateError, DigitallySignedStruct, SignatureScheme};
use vpn_agent_common::API_KEY_HEADER;

use crate::application::ports::HealthProbe;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Blocking `ureq` client run on the blocking pool.
pub struct UreqHealthProbe;

impl HealthProbe for UreqHealthProbe {
    async fn probe(&self, url: &str, api_key: &str, ca_cert: &Path) -> Result<u16> {
        let tls = pinned_client_config(ca_cert)?;
        let url = url.to_string();
        let api_key = api_key.to_string();
        tokio::task::spawn_blocking(move || {
            let agent = ureq::AgentBuilder::new()
                .tls_config(Arc::new(tls))
                .timeout(PROBE_TIMEOUT)
                .build();
            match agent.get(&url).set(API_KEY_HEADER, &api_key).call() {
                Ok(resp) => Ok(resp.status()),
                Err(ureq::Error::Status(code, _)) => Ok(code),
                Err(e) => Err(anyhow::Error::new(e).context(format!("requesting {url}"))),
            }
        })
        .await
        .context("health probe task panicked")?
    }
}

/// Client config that accepts exactly the certificate in `cert_path`.
///
/// The agent's certificate is self-signed, so it is compared byte for byte
/// instead of being chained to a root store.
fn pinned_client_config(cert_path: &Path) -> Result<rustls::ClientConfig> {
    let file = File::open(cert_path)
        .with_context(|| format!("failed to open certificate {}", cert_path.display()))?;
    let pinned = rustls_pemfile::certs(&mut BufReader::new(file))
        .next()
        .context("no certificate found in file")?
        .context("failed to parse certificate")?;

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let verifier = PinnedCert {
        pinned,
        provider: Arc::clone(&provider),
    };
    Ok(rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .context("failed to select TLS protocol versions")?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(verifier))
        .with_no_client_auth())
}

#[derive(Debug)]
struct PinnedCert {
    pinned: CertificateDer<'static>,
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for PinnedCert {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        if end_entity.as_ref() == self.pinned.as_ref() {
            Ok(ServerCertVerified::assertion())
        } else {
            Err(rustls::Error::InvalidCertificate(CertificateError::UnknownIssuer))
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider.signature_verification_algorithms.supported_schemes()
    }
}
