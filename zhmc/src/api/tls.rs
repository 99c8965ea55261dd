//! TLS configuration for the console connection

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::pki_types::CertificateDer;
use rustls::{ClientConfig, RootCertStore};

use super::config::ClientOptions;
use super::error::{ErrorKind, HmcError, Result};

/// Build the rustls configuration for `options`.
///
/// Returns `None` when neither verification skipping nor a custom root
/// certificate is requested; reqwest's defaults apply then. A configured PEM
/// file is always loaded, so an unreadable file fails construction even when
/// verification is skipped.
pub fn build_tls_config(options: &ClientOptions) -> Result<Option<ClientConfig>> {
    let roots = match options.ca_cert.as_deref() {
        Some(path) => Some(load_root_store(path)?),
        None => None,
    };

    if options.skip_cert_verify {
        tracing::debug!("TLS certificate verification disabled");
        let config = config_builder()?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(SkipServerVerification))
            .with_no_client_auth();
        return Ok(Some(config));
    }

    match roots {
        Some(roots) => Ok(Some(
            config_builder()?
                .with_root_certificates(roots)
                .with_no_client_auth(),
        )),
        None => Ok(None),
    }
}

fn config_builder() -> Result<rustls::ConfigBuilder<ClientConfig, rustls::WantsVerifier>> {
    ClientConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
        .with_safe_default_protocol_versions()
        .map_err(|e| HmcError::new(ErrorKind::InvalidUrl, format!("TLS setup failed: {}", e)))
}

/// Load every certificate of a PEM file into a fresh root store.
pub fn load_root_store(path: &Path) -> Result<RootCertStore> {
    let file = File::open(path).map_err(|e| {
        HmcError::new(
            ErrorKind::InvalidUrl,
            format!("cannot read CA certificate {}: {}", path.display(), e),
        )
    })?;

    let certs = rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<std::result::Result<Vec<CertificateDer<'static>>, _>>()
        .map_err(|e| {
            HmcError::new(
                ErrorKind::InvalidUrl,
                format!("cannot parse CA certificate {}: {}", path.display(), e),
            )
        })?;

    let mut store = RootCertStore::empty();
    let (added, ignored) = store.add_parsable_certificates(certs);
    if added == 0 {
        return Err(HmcError::new(
            ErrorKind::InvalidUrl,
            format!("no usable certificate in {}", path.display()),
        ));
    }
    if ignored > 0 {
        tracing::warn!(
            "ignored {} unparseable certificate(s) in {}",
            ignored,
            path.display()
        );
    }

    Ok(store)
}

/// Accepts any server certificate.
#[derive(Debug)]
struct SkipServerVerification;

impl rustls::client::danger::ServerCertVerifier for SkipServerVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> std::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        rustls::crypto::ring::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}
