//! Remotely published cloud provider range documents.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::Deserialize;

use super::{IpRange, Provider, Registry, parse_range};
use crate::cache::MonthlyFileCache;
use crate::error::{InspectorError, InspectorResult};
use crate::traits::DocumentFetcher;

#[derive(Debug, Deserialize)]
struct AmazonDocument {
    #[serde(default)]
    prefixes: Vec<AmazonPrefix>,
    #[serde(default)]
    ipv6_prefixes: Vec<AmazonIpv6Prefix>,
}

#[derive(Debug, Deserialize)]
struct AmazonPrefix {
    ip_prefix: String,
    service: String,
}

#[derive(Debug, Deserialize)]
struct AmazonIpv6Prefix {
    ipv6_prefix: String,
    service: String,
}

#[derive(Debug, Deserialize)]
struct AzureDocument {
    #[serde(default)]
    values: Vec<AzureServiceTag>,
}

#[derive(Debug, Deserialize)]
struct AzureServiceTag {
    name: String,
    properties: AzureProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzureProperties {
    #[serde(default)]
    address_prefixes: Vec<String>,
}

fn tagged(provider: Provider, prefix: &str, service: &str) -> Option<IpRange> {
    let net = parse_range(prefix);
    if net.is_none() {
        warn!("[Ranges] {provider}: ignoring malformed prefix '{prefix}' ({service})");
    }
    net.map(|net| IpRange::new(net, provider, Some(service)))
}

/// Amazon's `ip-ranges.json`: IPv4 and IPv6 prefixes tagged by service.
pub fn parse_amazon(json: &str) -> InspectorResult<Vec<IpRange>> {
    let document: AmazonDocument = serde_json::from_str(json)
        .map_err(|e| InspectorError::ParseError(format!("Amazon ranges: {e}")))?;

    let v4 = document
        .prefixes
        .iter()
        .filter_map(|p| tagged(Provider::Amazon, &p.ip_prefix, &p.service));
    let v6 = document
        .ipv6_prefixes
        .iter()
        .filter_map(|p| tagged(Provider::Amazon, &p.ipv6_prefix, &p.service));
    Ok(v4.chain(v6).collect())
}

/// Azure service tags: each tag name carries its address prefixes.
pub fn parse_azure(json: &str) -> InspectorResult<Vec<IpRange>> {
    let document: AzureDocument = serde_json::from_str(json)
        .map_err(|e| InspectorError::ParseError(format!("Azure ranges: {e}")))?;

    Ok(document
        .values
        .iter()
        .flat_map(|tag| {
            tag.properties
                .address_prefixes
                .iter()
                .filter_map(|prefix| tagged(Provider::Azure, prefix, &tag.name))
        })
        .collect())
}

/// A range document refreshed at most once per calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    Amazon,
    Azure,
}

impl Feed {
    pub fn provider(self) -> Provider {
        match self {
            Self::Amazon => Provider::Amazon,
            Self::Azure => Provider::Azure,
        }
    }

    pub fn cache_key(self) -> String {
        format!("{}-ip-ranges", self.provider().tag())
    }

    pub fn parse(self, json: &str) -> InspectorResult<Vec<IpRange>> {
        match self {
            Self::Amazon => parse_amazon(json),
            Self::Azure => parse_azure(json),
        }
    }

    /// Build this feed's registry from the month's cached document, fetching
    /// `url` if there is none or it no longer parses. Only a document that
    /// parses is cached. Never fails: an unavailable or malformed document
    /// produces an empty registry.
    pub async fn refresh(
        self,
        url: &str,
        cache: &MonthlyFileCache,
        fetcher: &dyn DocumentFetcher,
        now: DateTime<Utc>,
    ) -> Registry {
        let provider = self.provider();
        let ranges = cache
            .get_or_fetch_with(
                &self.cache_key(),
                now,
                |json| self.parse(json),
                move || async move {
                    debug!("[Ranges] Fetching {provider} ranges from {url}");
                    fetcher.fetch_document(url).await
                },
            )
            .await;

        match ranges {
            Ok(ranges) => {
                debug!("[Ranges] {provider}: {} ranges", ranges.len());
                Registry::new(provider, ranges)
            }
            Err(e) => {
                warn!("[Ranges] {provider} ranges unavailable, treating as empty: {e}");
                Registry::empty(provider)
            }
        }
    }
}
