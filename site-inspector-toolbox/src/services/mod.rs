//! Network collaborators and the stateless lookup façade.

mod http;
mod resolver;
mod ssl;
mod whois;

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

pub use http::{HttpClient, HttpOptions};
pub use resolver::{DEFAULT_DNS_TIMEOUT, DEFAULT_NAMESERVER, DnsClient};

use crate::error::{ToolboxError, ToolboxResult};
use crate::types::{CertificateFacts, WhoisResult};

static LABEL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-z\d](-*[a-z\d])*$").ok());

/// Validate and normalise a domain name or IP address input.
///
/// Trims whitespace and a trailing dot, passes IP addresses through, converts
/// internationalised names to ASCII via IDNA 2008 and checks every label.
pub fn validate_domain(domain: &str) -> ToolboxResult<String> {
    let domain = domain.trim().trim_end_matches('.');
    if domain.is_empty() {
        return Err(ToolboxError::ValidationError(
            "Domain name is required".to_string(),
        ));
    }
    if domain.parse::<std::net::IpAddr>().is_ok() {
        return Ok(domain.to_string());
    }

    let ascii_domain = idna::domain_to_ascii_strict(domain)
        .map_err(|_| ToolboxError::ValidationError(format!("Invalid domain name: {domain}")))?
        .to_lowercase();
    if ascii_domain.len() > 253 {
        return Err(ToolboxError::ValidationError(format!(
            "Domain name exceeds maximum length of 253 characters (got {})",
            ascii_domain.len()
        )));
    }

    let label_re = LABEL_RE.as_ref().ok_or_else(|| {
        ToolboxError::ValidationError("Domain label pattern unavailable".to_string())
    })?;
    for label in ascii_domain.split('.') {
        if label.is_empty() || label.len() > 63 || !label_re.is_match(label) {
            return Err(ToolboxError::ValidationError(format!(
                "Invalid domain label '{label}' in {ascii_domain}"
            )));
        }
    }

    Ok(ascii_domain)
}

/// Entry point for the one-shot lookups that need no client state.
///
/// ```rust,no_run
/// use std::time::Duration;
/// use site_inspector_toolbox::ToolboxService;
/// # async fn demo() -> site_inspector_toolbox::ToolboxResult<()> {
/// let whois = ToolboxService::whois_lookup("example.com", Duration::from_secs(10)).await?;
/// # Ok(())
/// # }
/// ```
pub struct ToolboxService;

impl ToolboxService {
    /// Query WHOIS registration data for a registrable domain.
    pub async fn whois_lookup(domain: &str, timeout: Duration) -> ToolboxResult<WhoisResult> {
        let domain = validate_domain(domain)?;
        whois::whois_lookup(&domain, timeout).await
    }

    /// Describe the certificate `host` serves on port 443.
    pub async fn certificate_facts(
        host: &str,
        timeout: Duration,
    ) -> ToolboxResult<CertificateFacts> {
        let host = validate_domain(host)?;
        ssl::certificate_facts(&host, timeout).await
    }
}
