//! Provider IP range registries.
//!
//! A [`RangeRegistry`] is an immutable snapshot of every provider's ranges,
//! built once per process and shared behind an `Arc`. Membership tests are
//! pure over the snapshot.

mod cidr;
mod curated;
mod feeds;

use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;

use chrono::Utc;
use ipnet::IpNet;
use log::info;
use serde::Serialize;

use crate::cache::MonthlyFileCache;
use crate::config::InspectorConfig;
use crate::traits::DocumentFetcher;

pub use cidr::{ip_in_range, parse_range, parse_ranges};
pub use curated::labels;
pub use feeds::{Feed, parse_amazon, parse_azure};

/// Source of a group of ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Cloudflare,
    Fastly,
    Incapsula,
    Akamai,
    Amazon,
    Azure,
    /// Individually labelled hand-curated ranges; the label is the service tag.
    Curated,
}

impl Provider {
    pub const ALL: [Self; 7] = [
        Self::Cloudflare,
        Self::Fastly,
        Self::Incapsula,
        Self::Akamai,
        Self::Amazon,
        Self::Azure,
        Self::Curated,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Self::Cloudflare => "cloudflare",
            Self::Fastly => "fastly",
            Self::Incapsula => "incapsula",
            Self::Akamai => "akamai",
            Self::Amazon => "amazon",
            Self::Azure => "azure",
            Self::Curated => "curated",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One network with the provider that published it and, where the provider
/// splits its ranges by product, the service tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpRange {
    pub net: IpNet,
    pub provider: Provider,
    pub service: Option<String>,
}

impl IpRange {
    pub fn new(net: IpNet, provider: Provider, service: Option<&str>) -> Self {
        Self {
            net,
            provider,
            service: service.map(str::to_string),
        }
    }

    pub fn contains(&self, ip: &IpAddr) -> bool {
        self.net.contains(ip)
    }
}

/// All ranges published by one provider.
#[derive(Debug, Clone)]
pub struct Registry {
    provider: Provider,
    ranges: Vec<IpRange>,
}

impl Registry {
    pub fn new(provider: Provider, ranges: Vec<IpRange>) -> Self {
        Self { provider, ranges }
    }

    pub fn empty(provider: Provider) -> Self {
        Self::new(provider, Vec::new())
    }

    /// Untagged registry from range literals; malformed entries are dropped.
    pub fn from_cidrs<'a>(provider: Provider, cidrs: impl IntoIterator<Item = &'a str>) -> Self {
        let ranges = parse_ranges(provider.tag(), cidrs)
            .into_iter()
            .map(|net| IpRange::new(net, provider, None))
            .collect();
        Self::new(provider, ranges)
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn ranges(&self) -> &[IpRange] {
        &self.ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// With a service tag, only ranges carrying exactly that tag are tested.
    pub fn contains(&self, ip: &IpAddr, service: Option<&str>) -> bool {
        self.ranges
            .iter()
            .filter(|range| service.is_none_or(|s| range.service.as_deref() == Some(s)))
            .any(|range| range.contains(ip))
    }
}

/// Snapshot of every provider registry.
#[derive(Debug, Clone)]
pub struct RangeRegistry {
    registries: HashMap<Provider, Registry>,
}

impl RangeRegistry {
    /// Hand-curated ranges only; remotely published feeds are left empty.
    pub fn curated() -> Self {
        let mut registries: HashMap<Provider, Registry> = Provider::ALL
            .iter()
            .map(|&p| (p, Registry::empty(p)))
            .collect();
        for registry in curated::registries() {
            registries.insert(registry.provider(), registry);
        }
        Self { registries }
    }

    /// Curated ranges plus this month's Amazon and Azure documents, fetched
    /// through the cache when no copy exists yet. An unavailable feed leaves
    /// its registry empty.
    pub async fn load(
        config: &InspectorConfig,
        cache: &MonthlyFileCache,
        fetcher: &dyn DocumentFetcher,
    ) -> Self {
        let now = Utc::now();
        let mut snapshot = Self::curated();
        for (feed, url) in [
            (Feed::Amazon, config.amazon_ranges_url.as_str()),
            (Feed::Azure, config.azure_ranges_url.as_str()),
        ] {
            let registry = feed.refresh(url, cache, fetcher, now).await;
            snapshot = snapshot.with_registry(registry);
        }

        info!(
            "[Ranges] Loaded {} ranges across {} registries",
            snapshot.registries.values().map(Registry::len).sum::<usize>(),
            snapshot.registries.len()
        );
        snapshot
    }

    /// Replace one provider's registry.
    #[must_use]
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registries.insert(registry.provider(), registry);
        self
    }

    pub fn registry(&self, provider: Provider) -> Option<&Registry> {
        self.registries.get(&provider)
    }

    /// Whether `ip` is inside one of `provider`'s ranges, restricted to
    /// `service` when given. Anything that is not an IP literal is outside.
    pub fn in_range(&self, ip: &str, provider: Provider, service: Option<&str>) -> bool {
        let Ok(ip) = ip.trim().parse::<IpAddr>() else {
            return false;
        };
        self.contains(&ip, provider, service)
    }

    pub fn contains(&self, ip: &IpAddr, provider: Provider, service: Option<&str>) -> bool {
        self.registries
            .get(&provider)
            .is_some_and(|registry| registry.contains(ip, service))
    }
}

impl Default for RangeRegistry {
    fn default() -> Self {
        Self::curated()
    }
}
