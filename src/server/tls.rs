//! TLS material
//!
//! Loads operator-supplied PEM files, or bootstraps an in-memory self-signed
//! certificate for loopback use when none are configured.

use axum_server::tls_rustls::RustlsConfig;
use log::info;
use rcgen::{
    CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose, KeyPair,
    KeyUsagePurpose,
};
use time::OffsetDateTime;

use crate::config::ServerConfig;
use crate::error::CertError;

/// Subject alternative names of the bootstrap certificate.
pub const SELF_SIGNED_NAMES: [&str; 3] = ["localhost", "127.0.0.1", "::1"];

const VALIDITY_DAYS: i64 = 365;
const ORGANIZATION: &str = "RAX File Server";

/// A PEM-encoded certificate and its private key.
#[derive(Clone)]
pub struct CertificateMaterial {
    pub cert_pem: String,
    pub key_pem: String,
}

/// Generates a fresh key pair and a one-year self-signed certificate for it.
pub fn generate_self_signed() -> Result<CertificateMaterial, CertError> {
    let names: Vec<String> = SELF_SIGNED_NAMES.iter().map(|n| n.to_string()).collect();
    let mut params = CertificateParams::new(names).map_err(generation_failed)?;

    let mut subject = DistinguishedName::new();
    subject.push(DnType::OrganizationName, ORGANIZATION);
    subject.push(DnType::CommonName, "localhost");
    params.distinguished_name = subject;

    let not_before = OffsetDateTime::now_utc();
    params.not_before = not_before;
    params.not_after = not_before + time::Duration::days(VALIDITY_DAYS);
    params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyEncipherment,
    ];
    params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];

    let key_pair = KeyPair::generate().map_err(generation_failed)?;
    let cert = params.self_signed(&key_pair).map_err(generation_failed)?;

    Ok(CertificateMaterial {
        cert_pem: cert.pem(),
        key_pem: key_pair.serialize_pem(),
    })
}

/// Builds the rustls configuration for the listener.
///
/// Uses the configured certificate and key when both are set; otherwise
/// generates a self-signed pair that lives only in memory.
pub async fn rustls_config(config: &ServerConfig) -> Result<RustlsConfig, CertError> {
    if let (Some(cert), Some(key)) = (&config.cert_file, &config.key_file) {
        info!("Using TLS certificate {} and key {}", cert, key);
        return RustlsConfig::from_pem_file(cert, key)
            .await
            .map_err(CertError::LoadFailed);
    }

    info!("No certificate configured, generating a self-signed certificate...");
    let material = generate_self_signed()?;
    let tls = RustlsConfig::from_pem(
        material.cert_pem.into_bytes(),
        material.key_pem.into_bytes(),
    )
    .await
    .map_err(CertError::LoadFailed)?;
    info!("Self-signed certificate ready");
    Ok(tls)
}

fn generation_failed(err: rcgen::Error) -> CertError {
    CertError::GenerationFailed(err.to_string())
}
