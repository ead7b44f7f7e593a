//! Edge Classifier: walks DNS answer chains through a [`HopClassifier`].

use std::net::{IpAddr, Ipv6Addr};
use std::sync::Arc;

use log::debug;
use serde::Serialize;
use site_inspector_toolbox::{DnsAnswerSet, HttpResponse, RecordKind};

use crate::rules::{EdgeMatch, HopClassifier, OPS_NAME, is_govcms_domain};
use crate::traits::DnsGateway;

pub const NO_AAAA_RECORD: &str = "No AAAA record";

/// What sits in front of a domain, for each address family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeReport {
    pub is_ops: bool,
    pub has_edge: bool,
    pub ipv4_text: String,
    pub ipv6_valid: bool,
    pub ipv6_text: String,
}

impl EdgeReport {
    /// The fixed answer for GovCMS edit domains.
    pub fn ops() -> Self {
        Self {
            is_ops: true,
            has_edge: true,
            ipv4_text: OPS_NAME.to_string(),
            ipv6_valid: true,
            ipv6_text: OPS_NAME.to_string(),
        }
    }
}

pub struct EdgeClassifier {
    rules: Arc<dyn HopClassifier>,
}

impl EdgeClassifier {
    pub fn new(rules: Arc<dyn HopClassifier>) -> Self {
        Self { rules }
    }

    /// Resolve `domain` through `dns` and classify both address chains.
    ///
    /// GovCMS edit domains short-circuit to [`EdgeReport::ops`] before any
    /// query is made.
    pub async fn classify_domain(
        &self,
        domain: &str,
        dns: &dyn DnsGateway,
        response: Option<&HttpResponse>,
    ) -> EdgeReport {
        if is_govcms_domain(domain) {
            debug!("[Edge] {domain} is a GovCMS edit domain");
            return EdgeReport::ops();
        }

        let ipv4 = dns.resolve(domain, RecordKind::Cname).await;
        let ipv6 = dns.resolve(domain, RecordKind::Aaaa).await;
        self.classify(domain, &ipv4, &ipv6, response)
    }

    /// Classify answers that were already resolved.
    pub fn classify(
        &self,
        domain: &str,
        ipv4: &DnsAnswerSet,
        ipv6: &DnsAnswerSet,
        response: Option<&HttpResponse>,
    ) -> EdgeReport {
        if is_govcms_domain(domain) {
            return EdgeReport::ops();
        }

        let mut ipv4_match = self.walk(ipv4.as_slice(), domain);
        if ipv4_match.is_unknown()
            && let Some(response) = response
        {
            let by_headers = self.rules.classify_headers(response);
            if !by_headers.is_unknown() {
                debug!("[Edge] {domain} identified by headers: {}", by_headers.name);
                ipv4_match = by_headers;
            }
        }

        let ipv6_match = self.walk(ipv6.as_slice(), domain);
        let ipv6_valid = has_ipv6_literal(ipv6);

        EdgeReport {
            is_ops: ipv4_match.is_ops,
            has_edge: ipv4_match.has_edge,
            ipv4_text: ipv4_match.name,
            ipv6_valid,
            ipv6_text: if ipv6_valid {
                ipv6_match.name
            } else {
                NO_AAAA_RECORD.to_string()
            },
        }
    }

    /// Classify hops in order. An address ends the walk whatever its match;
    /// an alias that matches nothing hands over to the rest of the chain.
    /// Each hop is classified at most once.
    pub fn walk(&self, answers: &[String], domain: &str) -> EdgeMatch {
        let mut remaining = answers;
        while let Some((hop, tail)) = remaining.split_first() {
            let matched = self.rules.classify(hop, domain);
            if is_address(hop) || !matched.is_unknown() {
                return matched;
            }
            debug!("[Edge] {hop} unmatched, following chain");
            remaining = tail;
        }
        EdgeMatch::unknown()
    }
}

fn is_address(hop: &str) -> bool {
    hop.trim().parse::<IpAddr>().is_ok()
}

fn has_ipv6_literal(answers: &DnsAnswerSet) -> bool {
    answers
        .iter()
        .any(|answer| answer.trim().parse::<Ipv6Addr>().is_ok())
}
