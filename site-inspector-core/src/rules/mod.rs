//! Ordered provider identification rules.
//!
//! A [`RuleTable`] is a list of predicate/outcome pairs evaluated strictly in
//! registration order; the first predicate that holds decides the
//! [`EdgeMatch`]. Hop rules (literal sets, name suffixes, range membership)
//! classify a single DNS answer. Header rules are only consulted by
//! [`HopClassifier::classify_headers`].

mod standard;

use std::sync::Arc;

use regex::Regex;
use serde::Serialize;
use site_inspector_toolbox::HttpResponse;

use crate::error::{InspectorError, InspectorResult};
use crate::ranges::{Provider, RangeRegistry};

/// Prefix shared by every "no rule fired" outcome.
pub const UNKNOWN: &str = "Unknown";

/// Outcome for origins shielded by the GovCMS proxy tier.
pub const OPS_NAME: &str = "GovCMS Origin Protection System (OPS)";

/// Edit domains served straight from the GovCMS platform.
pub fn is_govcms_domain(domain: &str) -> bool {
    let domain = domain.trim_end_matches('.');
    domain.ends_with(".govcms.gov.au") || domain.ends_with(".govcms.amazee.io")
}

/// Classification of a hop or a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeMatch {
    pub name: String,
    pub has_edge: bool,
    pub is_ops: bool,
}

impl EdgeMatch {
    pub fn new(name: impl Into<String>, has_edge: bool, is_ops: bool) -> Self {
        Self {
            name: name.into(),
            has_edge,
            is_ops,
        }
    }

    /// A known origin with nothing in front of it.
    pub fn origin(name: impl Into<String>) -> Self {
        Self::new(name, false, false)
    }

    /// A network that terminates client connections.
    pub fn edge(name: impl Into<String>) -> Self {
        Self::new(name, true, false)
    }

    pub fn ops() -> Self {
        Self::new(OPS_NAME, true, true)
    }

    /// Nothing matched and there is no record worth reporting.
    pub fn unknown() -> Self {
        Self::origin(UNKNOWN)
    }

    /// Nothing matched `record`.
    pub fn unknown_record(record: &str) -> Self {
        Self::origin(format!("{UNKNOWN} ({record})"))
    }

    pub fn is_unknown(&self) -> bool {
        self.name.starts_with(UNKNOWN)
    }
}

/// What a rule tests.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// The hop equals one of the values exactly.
    Exact(Vec<String>),
    /// The hop matches an anchored pattern, usually a name suffix.
    Suffix(Regex),
    /// The hop is an IP literal inside the provider's ranges carrying
    /// `service`, or any of its ranges when `service` is `None`.
    Cidr {
        provider: Provider,
        service: Option<String>,
    },
    /// The response carries the header with a non-empty value.
    Header(String),
}

impl Predicate {
    pub fn exact<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        Self::Exact(values.into_iter().map(str::to_string).collect())
    }

    pub fn suffix(pattern: &str) -> InspectorResult<Self> {
        Regex::new(pattern).map(Self::Suffix).map_err(|e| {
            InspectorError::ParseError(format!("Invalid rule pattern '{pattern}': {e}"))
        })
    }

    pub fn cidr(provider: Provider, service: Option<&str>) -> Self {
        Self::Cidr {
            provider,
            service: service.map(str::to_string),
        }
    }

    pub fn header(name: &str) -> Self {
        Self::Header(name.to_string())
    }

    pub fn is_header(&self) -> bool {
        matches!(self, Self::Header(_))
    }

    fn matches_hop(&self, hop: &str, ranges: &RangeRegistry) -> bool {
        match self {
            Self::Exact(values) => values.iter().any(|v| v == hop),
            Self::Suffix(pattern) => pattern.is_match(hop),
            Self::Cidr { provider, service } => ranges.in_range(hop, *provider, service.as_deref()),
            Self::Header(_) => false,
        }
    }

    fn matches_response(&self, response: &HttpResponse) -> bool {
        match self {
            Self::Header(name) => response.has_header(name),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub predicate: Predicate,
    pub outcome: EdgeMatch,
    /// Report [`EdgeMatch::ops`] instead of `outcome` when the queried domain
    /// is a GovCMS edit domain.
    pub ops_for_govcms: bool,
}

impl Rule {
    pub fn new(predicate: Predicate, outcome: EdgeMatch) -> Self {
        Self {
            predicate,
            outcome,
            ops_for_govcms: false,
        }
    }

    #[must_use]
    pub fn with_govcms_override(mut self) -> Self {
        self.ops_for_govcms = true;
        self
    }

    fn outcome_for(&self, domain: &str) -> EdgeMatch {
        if self.ops_for_govcms && is_govcms_domain(domain) {
            EdgeMatch::ops()
        } else {
            self.outcome.clone()
        }
    }
}

/// Classifies one DNS answer, or a response once the chain is exhausted.
///
/// Implementations must be pure: the same input always gives the same match.
pub trait HopClassifier: Send + Sync {
    /// `domain` is the name originally queried, used by domain-aware rules.
    fn classify(&self, hop: &str, domain: &str) -> EdgeMatch;

    fn classify_headers(&self, response: &HttpResponse) -> EdgeMatch;
}

/// Rules evaluated in order against a fixed range snapshot.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<Rule>,
    ranges: Arc<RangeRegistry>,
}

impl RuleTable {
    pub fn new(rules: Vec<Rule>, ranges: Arc<RangeRegistry>) -> Self {
        Self { rules, ranges }
    }

    /// The built-in provider rules.
    pub fn standard(ranges: Arc<RangeRegistry>) -> InspectorResult<Self> {
        Ok(Self::new(standard::rules()?, ranges))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn ranges(&self) -> &RangeRegistry {
        &self.ranges
    }
}

impl HopClassifier for RuleTable {
    fn classify(&self, hop: &str, domain: &str) -> EdgeMatch {
        let hop = hop.trim();
        if hop.is_empty() {
            return EdgeMatch::unknown();
        }

        self.rules
            .iter()
            .filter(|rule| !rule.predicate.is_header())
            .find(|rule| rule.predicate.matches_hop(hop, &self.ranges))
            .map_or_else(|| EdgeMatch::unknown_record(hop), |rule| rule.outcome_for(domain))
    }

    fn classify_headers(&self, response: &HttpResponse) -> EdgeMatch {
        self.rules
            .iter()
            .find(|rule| rule.predicate.matches_response(response))
            .map_or_else(EdgeMatch::unknown, |rule| rule.outcome.clone())
    }
}
