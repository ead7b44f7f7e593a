//! TLS certificate inspection.
//!
//! The handshake always completes so the leaf certificate can be read even
//! when it would not pass verification. Whether the standard webpki checks
//! succeeded is recorded on the side and folded into `is_valid`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use rustls::client::WebPkiServerVerifier;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};
use sha2::{Digest, Sha256};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use x509_parser::extensions::GeneralName;
use x509_parser::prelude::*;

use crate::error::{ToolboxError, ToolboxResult};
use crate::types::CertificateFacts;

/// Install the ring `CryptoProvider` unless one is already set.
fn ensure_crypto_provider() {
    // Err only means a provider is already installed.
    let _ = CryptoProvider::install_default(rustls::crypto::ring::default_provider());
}

/// Delegates to webpki and remembers the verdict instead of aborting the
/// handshake on failure.
#[derive(Debug)]
struct RecordingVerifier {
    inner: Arc<WebPkiServerVerifier>,
    verified: Arc<AtomicBool>,
}

impl ServerCertVerifier for RecordingVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let verdict = self.inner.verify_server_cert(
            end_entity,
            intermediates,
            server_name,
            ocsp_response,
            now,
        );
        if let Err(e) = &verdict {
            debug!("[SSL] Certificate did not verify: {e}");
        }
        self.verified.store(verdict.is_ok(), Ordering::SeqCst);
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

/// Connect to `host:443`, complete a TLS handshake and describe the leaf
/// certificate. Connection and handshake share the `timeout` budget.
pub async fn certificate_facts(host: &str, timeout: Duration) -> ToolboxResult<CertificateFacts> {
    ensure_crypto_provider();

    debug!("[SSL] Inspecting {host}:443");
    let start = Instant::now();

    let mut root_store = RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let webpki = WebPkiServerVerifier::builder(Arc::new(root_store))
        .build()
        .map_err(|e| ToolboxError::NetworkError(format!("Failed to build verifier: {e}")))?;

    let verified = Arc::new(AtomicBool::new(false));
    let verifier = RecordingVerifier {
        inner: webpki,
        verified: Arc::clone(&verified),
    };
    let config = ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(verifier))
        .with_no_client_auth();
    let connector = TlsConnector::from(Arc::new(config));

    let server_name = ServerName::try_from(host.to_string())
        .map_err(|_| ToolboxError::ValidationError(format!("Invalid host name: {host}")))?;

    let handshake = async {
        let stream = TcpStream::connect((host, 443))
            .await
            .map_err(|e| ToolboxError::NetworkError(format!("Connection failed: {e}")))?;
        connector
            .connect(server_name, stream)
            .await
            .map_err(|e| ToolboxError::NetworkError(format!("TLS handshake failed: {e}")))
    };

    let tls_stream = match tokio::time::timeout(timeout, handshake).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            warn!("[SSL] {host}: {e}");
            return Err(e);
        }
        Err(_) => {
            warn!("[SSL] {host}: timed out after {}s", timeout.as_secs());
            return Err(ToolboxError::Timeout(timeout.as_secs()));
        }
    };

    let (_, connection) = tls_stream.get_ref();
    let leaf = connection
        .peer_certificates()
        .and_then(|certs| certs.first())
        .ok_or_else(|| ToolboxError::NetworkError("No certificate presented".to_string()))?;

    let facts = describe_certificate(
        host,
        leaf.as_ref(),
        verified.load(Ordering::SeqCst),
        Utc::now(),
    )?;

    debug!(
        "[SSL] {host}: issuer={}, valid={}, expires_in={}d, time={:?}",
        facts.issuer,
        facts.is_valid,
        facts.days_until_expiration_date,
        start.elapsed()
    );

    Ok(facts)
}

/// Build [`CertificateFacts`] from a DER-encoded leaf certificate.
fn describe_certificate(
    host: &str,
    der: &[u8],
    chain_verified: bool,
    now: DateTime<Utc>,
) -> ToolboxResult<CertificateFacts> {
    let (_, cert) = X509Certificate::from_der(der)
        .map_err(|e| ToolboxError::NetworkError(format!("Certificate parsing failed: {e}")))?;

    let not_before = asn1_to_datetime(cert.validity().not_before)?;
    let not_after = asn1_to_datetime(cert.validity().not_after)?;

    let common_name = first_attribute(cert.subject().iter_common_name());
    let san: Vec<String> = cert
        .subject_alternative_name()
        .ok()
        .flatten()
        .map(|ext| {
            ext.value
                .general_names
                .iter()
                .filter_map(|name| match name {
                    GeneralName::DNSName(dns) => Some((*dns).to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    let mut domains: Vec<String> = Vec::with_capacity(san.len() + 1);
    for name in common_name.iter().chain(san.iter()) {
        if !domains.contains(name) {
            domains.push(name.clone());
        }
    }

    let in_window = not_before <= now && now <= not_after;
    let name_matches = check_domain_match(host, common_name.as_deref(), &san);

    let signature_algorithm =
        signature_algorithm_name(&cert.signature_algorithm.algorithm.to_id_string());
    let uses_sha1_hash = signature_algorithm.to_uppercase().contains("SHA1");

    Ok(CertificateFacts {
        days_until_expiration_date: (not_after - now).num_days(),
        domains,
        expiration_date: not_after.format("%Y-%m-%d").to_string(),
        fingerprint: hex::encode(Sha256::digest(der)),
        issuer: friendly_issuer(
            &first_attribute(cert.issuer().iter_common_name()).unwrap_or_default(),
        ),
        is_valid: chain_verified && in_window && name_matches,
        lifespan_in_days: (not_after - not_before).num_days(),
        organization: first_attribute(cert.issuer().iter_organization()),
        signature_algorithm,
        uses_sha1_hash,
        valid_from_date: not_before.format("%Y-%m-%d").to_string(),
    })
}

fn asn1_to_datetime(time: ASN1Time) -> ToolboxResult<DateTime<Utc>> {
    DateTime::from_timestamp(time.timestamp(), 0).ok_or_else(|| {
        ToolboxError::NetworkError(format!("Certificate date out of range: {}", time.timestamp()))
    })
}

fn first_attribute<'a, 'b: 'a>(
    mut values: impl Iterator<Item = &'a AttributeTypeAndValue<'b>>,
) -> Option<String> {
    values
        .next()
        .and_then(|v| v.as_str().ok())
        .map(str::to_string)
}

/// Spell out Let's Encrypt intermediates, whose issuer names are bare codes.
fn friendly_issuer(issuer: &str) -> String {
    match issuer {
        "R3" => "Let's Encrypt R3".to_string(),
        "R4" => "Let's Encrypt R4 (backup)".to_string(),
        "E1" => "Let's Encrypt E1".to_string(),
        "E2" => "Let's Encrypt E2 (backup)".to_string(),
        "R10" | "R11" | "E5" | "E6" => format!("Let's Encrypt {issuer}"),
        other => other.to_string(),
    }
}

/// OpenSSL short name for a signature algorithm OID.
fn signature_algorithm_name(oid: &str) -> String {
    match oid {
        "1.2.840.113549.1.1.4" => "RSA-MD5",
        "1.2.840.113549.1.1.5" => "RSA-SHA1",
        "1.2.840.113549.1.1.10" => "RSASSA-PSS",
        "1.2.840.113549.1.1.11" => "RSA-SHA256",
        "1.2.840.113549.1.1.12" => "RSA-SHA384",
        "1.2.840.113549.1.1.13" => "RSA-SHA512",
        "1.2.840.10045.4.1" => "ecdsa-with-SHA1",
        "1.2.840.10045.4.3.2" => "ecdsa-with-SHA256",
        "1.2.840.10045.4.3.3" => "ecdsa-with-SHA384",
        "1.2.840.10045.4.3.4" => "ecdsa-with-SHA512",
        "1.3.101.112" => "ED25519",
        "1.3.101.113" => "ED448",
        other => other,
    }
    .to_string()
}

/// Whether `host` matches the certificate's CN or any SAN.
fn check_domain_match(host: &str, cn: Option<&str>, san: &[String]) -> bool {
    let host = host.to_lowercase();
    cn.into_iter()
        .chain(san.iter().map(String::as_str))
        .any(|name| matches_domain(&host, &name.to_lowercase()))
}

/// Exact match, or a `*.` wildcard covering exactly one label.
fn matches_domain(host: &str, pattern: &str) -> bool {
    if host == pattern {
        return true;
    }
    pattern
        .strip_prefix("*.")
        .and_then(|suffix| host.strip_suffix(suffix))
        .and_then(|prefix| prefix.strip_suffix('.'))
        .is_some_and(|label| !label.is_empty() && !label.contains('.'))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_domain_exact() {
        assert!(matches_domain("example.com", "example.com"));
        assert!(!matches_domain("example.com", "other.com"));
    }

    #[test]
    fn test_matches_domain_wildcard_single_label() {
        assert!(matches_domain("www.example.com", "*.example.com"));
        assert!(!matches_domain("a.b.example.com", "*.example.com"));
    }

    #[test]
    fn test_matches_domain_wildcard_not_bare() {
        assert!(!matches_domain("example.com", "*.example.com"));
        assert!(!matches_domain(".example.com", "*.example.com"));
    }

    #[test]
    fn test_matches_domain_no_partial() {
        assert!(!matches_domain("notexample.com", "example.com"));
        assert!(!matches_domain("wwwexample.com", "*.example.com"));
    }

    #[test]
    fn test_check_domain_match_san_and_case() {
        let san = vec!["*.Example.com".to_string()];
        assert!(check_domain_match("API.example.com", None, &san));
        assert!(check_domain_match("EXAMPLE.COM", Some("example.com"), &[]));
        assert!(!check_domain_match("evil.com", Some("example.com"), &san));
        assert!(!check_domain_match("example.com", None, &[]));
    }

    #[test]
    fn test_friendly_issuer() {
        assert_eq!(friendly_issuer("R3"), "Let's Encrypt R3");
        assert_eq!(friendly_issuer("E2"), "Let's Encrypt E2 (backup)");
        assert_eq!(friendly_issuer("R11"), "Let's Encrypt R11");
        assert_eq!(
            friendly_issuer("DigiCert Global G2 TLS RSA SHA256 2020 CA1"),
            "DigiCert Global G2 TLS RSA SHA256 2020 CA1"
        );
    }

    #[test]
    fn test_signature_algorithm_name() {
        assert_eq!(signature_algorithm_name("1.2.840.113549.1.1.11"), "RSA-SHA256");
        assert_eq!(signature_algorithm_name("1.2.840.10045.4.3.2"), "ecdsa-with-SHA256");
        assert_eq!(signature_algorithm_name("1.2.3.4"), "1.2.3.4");
    }

    #[test]
    fn test_sha1_detection_uses_name() {
        assert!(signature_algorithm_name("1.2.840.113549.1.1.5")
            .to_uppercase()
            .contains("SHA1"));
        assert!(!signature_algorithm_name("1.2.840.113549.1.1.11")
            .to_uppercase()
            .contains("SHA1"));
    }

    #[test]
    fn test_describe_rejects_garbage() {
        let result = describe_certificate("example.com", b"not a certificate", true, Utc::now());
        assert!(matches!(result, Err(ToolboxError::NetworkError(_))));
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_certificate_facts_real() {
        let facts = certificate_facts("www.google.com", Duration::from_secs(5))
            .await
            .unwrap();
        assert!(facts.is_valid);
        assert!(facts.days_until_expiration_date > 0);
        assert!(facts.domains.iter().any(|d| d.contains("google")));
        assert_eq!(facts.fingerprint.len(), 64);
    }
}
