//! DNS queries against one fixed upstream resolver.
//!
//! Answers are rendered the way `dig +short` prints them: alias targets as
//! fully-qualified names with a trailing dot, addresses as literals, in
//! answer order.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use hickory_resolver::{
    TokioResolver,
    config::{NameServerConfigGroup, ResolverConfig, ResolverOpts},
    name_server::TokioConnectionProvider,
    proto::rr::{Name, RData, Record, RecordType},
};
use log::debug;

use crate::types::{DnsAnswerSet, RecordKind};

/// Cloudflare's public resolver.
pub const DEFAULT_NAMESERVER: IpAddr = IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1));

/// Default per-query timeout.
pub const DEFAULT_DNS_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolver bound to a single nameserver.
pub struct DnsClient {
    resolver: TokioResolver,
    nameserver: IpAddr,
}

impl DnsClient {
    /// Build a client that only ever asks `nameserver`, giving up after
    /// `timeout` per query.
    pub fn new(nameserver: IpAddr, timeout: Duration) -> Self {
        let config = ResolverConfig::from_parts(
            None,
            vec![],
            NameServerConfigGroup::from_ips_clear(&[nameserver], 53, true),
        );
        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 1;
        opts.preserve_intermediates = true;

        let resolver =
            TokioResolver::builder_with_config(config, TokioConnectionProvider::default())
                .with_options(opts)
                .build();

        Self {
            resolver,
            nameserver,
        }
    }

    /// The upstream this client queries.
    pub fn nameserver(&self) -> IpAddr {
        self.nameserver
    }

    /// Query `name` for `kind`. Resolver failures, timeouts and NXDOMAIN all
    /// come back as an empty answer set.
    pub async fn query(&self, name: &str, kind: RecordKind) -> DnsAnswerSet {
        let fqdn = format!("{}.", name.trim_end_matches('.'));
        let record_type = match kind {
            RecordKind::Cname => RecordType::A,
            RecordKind::Aaaa => RecordType::AAAA,
            RecordKind::Ns => RecordType::NS,
        };

        match self.resolver.lookup(fqdn.as_str(), record_type).await {
            Ok(lookup) => {
                let answers = answers_from_records(lookup.record_iter(), kind);
                debug!(
                    "[DNS] {kind} {name} @{}: {} answer(s)",
                    self.nameserver,
                    answers.len()
                );
                answers
            }
            Err(e) => {
                debug!("[DNS] {kind} {name} @{} returned nothing: {e}", self.nameserver);
                DnsAnswerSet::empty()
            }
        }
    }
}

/// Render answer records for `kind` in answer order.
fn answers_from_records<'a>(
    records: impl Iterator<Item = &'a Record>,
    kind: RecordKind,
) -> DnsAnswerSet {
    let mut answers: Vec<String> = records
        .filter_map(|record| match (record.data(), kind) {
            (RData::CNAME(cname), RecordKind::Cname | RecordKind::Aaaa) => {
                Some(fqdn_text(&cname.0))
            }
            (RData::A(a), RecordKind::Cname) => Some(a.0.to_string()),
            (RData::AAAA(aaaa), RecordKind::Aaaa) => Some(aaaa.0.to_string()),
            (RData::NS(ns), RecordKind::Ns) => Some(fqdn_text(&ns.0)),
            _ => None,
        })
        .collect();

    if kind == RecordKind::Ns {
        answers.sort();
        answers.dedup();
    }

    DnsAnswerSet::new(answers)
}

/// Lowercase ASCII form of a name, always terminated by a dot.
fn fqdn_text(name: &Name) -> String {
    let mut text = name.to_ascii().to_lowercase();
    if !text.ends_with('.') {
        text.push('.');
    }
    text
}
