//! Authoritative nameservers of the registrable domain and who runs them.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use log::debug;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use site_inspector_toolbox::RecordKind;

use super::{Plugin, to_json};
use crate::context::ClassificationContext;
use crate::error::InspectorResult;
use crate::traits::DnsGateway;

const PROVIDERS: &[(&str, &str)] = &[
    (r"\.ns\.cloudflare\.com\.$", "Cloudflare"),
    (r"\.akam\.net\.$", "Akamai"),
    (r"\.awsdns-", "Amazon Route 53"),
    (r"\.azure-dns\.com\.$", "Azure"),
    (r"\.sge\.net\.$", "Verizon Business"),
    (r"\.chillit\.net\.au\.$", "Chill IT Australia"),
    (r"\.ultradns\.", "Neustar UltraDNS"),
    (r"^ns\d\.amazee\.io\.$", "amazee.io DNS"),
    (r"\.domaincontrol\.com\.$", "GoDaddy DNS"),
    (r"\.stabletransit\.com\.$", "Rackspace Cloud services DNS"),
    (r"\.name-services\.com\.$", "enom.com DNS"),
    (r"\.websitewelcome\.com\.$", "HostGator DNS"),
    (r"\.yourhostingaccount\.com\.$", "Powweb.com DNS"),
    (r"\.hosteurope\.com\.$", "Domainbox.com (Domainmonster & Mesh Digital) DNS"),
    (r"\.(guardedhost\.com|guardeddns\.net)\.$", "AMHmhosting DNS"),
    (r"\.registrar-servers\.com\.$", "NameCheap DNS"),
    (r"\.privatedns\.com\.$", "MelbourneIT DNS"),
    (r"\.livedns\.co\.uk\.$", "FastHosts & UKReg DNS"),
    (r"\.orderbox-dns\.com\.$", "ResellerClub DNS"),
    (r"\.thewebhostserver\.com\.$", "EZPZhosting DNS"),
    (r"\.rzone\.de\.$", "Strato.de DNS"),
    (r"\.panthur\.com\.$", "Panthur.com.au DNS"),
    (
        r"\.tmns\.net\.au\.$|\.server-dns\.com(\.au)?\.$|\.server-dns-us\.com\.$",
        "Telstra/BigPond DNS",
    ),
    (r"\.bigpond\.com\.$", "BigPond Basic Hosting DNS"),
    (r"\.telstra\.net\.$", "Telstra Custdata DNS"),
    (r"\.secure\.net\.$", "Telstra T-Suite DNS"),
    (r"\.catalyst\.net\.nz\.$", "Catalyst IT (New Zealand) DNS"),
];

static PROVIDER_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    PROVIDERS
        .iter()
        .filter_map(|&(pattern, name)| Regex::new(pattern).ok().map(|re| (re, name)))
        .collect()
});

/// Operator of the first nameserver, in the given order, that a known
/// provider pattern matches. Names are fully qualified with a trailing dot.
pub fn dns_provider(nameservers: &[String]) -> String {
    nameservers
        .iter()
        .find_map(|ns| {
            PROVIDER_PATTERNS
                .iter()
                .find(|(re, _)| re.is_match(ns))
                .map(|(_, name)| (*name).to_string())
        })
        .unwrap_or_default()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct NameserversReport {
    dns_provider: String,
    nameservers: Vec<String>,
}

pub struct NameserversPlugin {
    dns: Arc<dyn DnsGateway>,
}

impl NameserversPlugin {
    pub fn new(dns: Arc<dyn DnsGateway>) -> Self {
        Self { dns }
    }
}

#[async_trait]
impl Plugin for NameserversPlugin {
    fn machine_name(&self) -> &'static str {
        "nameservers"
    }

    async fn analyse(&self, ctx: &ClassificationContext) -> InspectorResult<Value> {
        let registrable = ctx.registrable_domain();
        if registrable.is_empty() {
            return to_json(&NameserversReport::default());
        }

        let mut nameservers = self.dns.resolve(registrable, RecordKind::Ns).await.into_inner();
        nameservers.sort();
        let dns_provider = dns_provider(&nameservers);
        debug!("[Plugin] {registrable}: {} nameservers, provider '{dns_provider}'", nameservers.len());

        to_json(&NameserversReport {
            dns_provider,
            nameservers,
        })
    }
}
