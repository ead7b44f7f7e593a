//! Classification Context: everything gathered about a domain before any
//! plugin runs.
//!
//! A context is assembled once per analysis and never changes afterwards;
//! plugins only ever see it by shared reference.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use async_trait::async_trait;
use log::debug;
use regex::Regex;
use serde::Serialize;
use site_inspector_toolbox::{DnsAnswerSet, HomepageFetch, HttpResponse, RecordKind};

use crate::traits::{DnsGateway, HomepageFetcher};

/// Public-suffix view of a domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainDetails {
    pub domain: String,
    pub registrable_domain: Option<String>,
    pub sub_domain: Option<String>,
    pub public_suffix: Option<String>,
    pub is_known: bool,
    #[serde(rename = "isICANN")]
    pub is_icann: bool,
    pub is_private: bool,
}

impl DomainDetails {
    pub fn resolve(domain: &str) -> Self {
        let domain = domain.trim_end_matches('.').to_lowercase();
        if domain.parse::<std::net::IpAddr>().is_ok() {
            return Self {
                domain,
                ..Self::default()
            };
        }

        let (public_suffix, is_known, typ) = match psl::suffix(domain.as_bytes()) {
            Some(suffix) => (Some(lossy(suffix.as_bytes())), suffix.is_known(), suffix.typ()),
            None => (None, false, None),
        };
        let registrable_domain = psl::domain(domain.as_bytes()).map(|d| lossy(d.as_bytes()));
        let sub_domain = registrable_domain.as_deref().and_then(|registrable| {
            domain
                .strip_suffix(registrable)
                .and_then(|rest| rest.strip_suffix('.'))
                .filter(|rest| !rest.is_empty())
                .map(str::to_string)
        });

        Self {
            registrable_domain,
            sub_domain,
            public_suffix,
            is_known,
            is_icann: typ == Some(psl::Type::Icann),
            is_private: typ == Some(psl::Type::Private),
            domain,
        }
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

static META_TAG_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?is)<\s*meta\s[^>]*>").ok());

static ATTRIBUTE_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?is)([a-z][a-z0-9_:-]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).ok()
});

/// `<meta>` tags keyed by `name`, `property` or `http-equiv`, mapped to their
/// decoded `content`. Later tags overwrite earlier ones with the same key.
pub fn parse_meta_tags(html: &str) -> BTreeMap<String, String> {
    let (Some(tag_re), Some(attr_re)) = (META_TAG_RE.as_ref(), ATTRIBUTE_RE.as_ref()) else {
        return BTreeMap::new();
    };

    let mut tags = BTreeMap::new();
    for tag in tag_re.find_iter(html) {
        let mut key = None;
        let mut content = None;
        for attr in attr_re.captures_iter(tag.as_str()) {
            let name = attr.get(1).map_or("", |m| m.as_str()).to_ascii_lowercase();
            let value = attr
                .get(2)
                .or_else(|| attr.get(3))
                .or_else(|| attr.get(4))
                .map_or("", |m| m.as_str().trim());
            match name.as_str() {
                "name" | "property" | "http-equiv" if key.is_none() => key = Some(value.to_string()),
                "content" => content = Some(value.to_string()),
                _ => {}
            }
        }
        if let (Some(key), Some(content)) = (key, content) {
            tags.insert(decode_entities(&key), decode_entities(&content));
        }
    }
    tags
}

/// Undo the HTML escaping of the five special characters.
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Read-only facts about one domain shared by every plugin.
#[derive(Debug, Clone)]
pub struct ClassificationContext {
    domain: String,
    response: Option<HttpResponse>,
    has_ssl: bool,
    connect_error: Option<String>,
    ipv4_answers: DnsAnswerSet,
    ipv6_answers: DnsAnswerSet,
    meta_tags: BTreeMap<String, String>,
    domain_details: DomainDetails,
}

impl ClassificationContext {
    /// Assemble a context from data already collected.
    pub fn new(
        domain: &str,
        homepage: HomepageFetch,
        ipv4_answers: DnsAnswerSet,
        ipv6_answers: DnsAnswerSet,
    ) -> Self {
        let meta_tags = homepage
            .response
            .as_ref()
            .map(|r| parse_meta_tags(&r.body))
            .unwrap_or_default();

        Self {
            domain: domain.to_string(),
            response: homepage.response,
            has_ssl: homepage.has_ssl,
            connect_error: homepage.connect_error,
            ipv4_answers,
            ipv6_answers,
            meta_tags,
            domain_details: DomainDetails::resolve(domain),
        }
    }

    /// Fetch the homepage, then resolve both address chains, one call at a time.
    pub async fn gather(
        domain: &str,
        homepage: &dyn HomepageFetcher,
        dns: &dyn DnsGateway,
    ) -> Self {
        let fetch = homepage.fetch_homepage(domain).await;
        let ipv4 = dns.resolve(domain, RecordKind::Cname).await;
        let ipv6 = dns.resolve(domain, RecordKind::Aaaa).await;
        debug!(
            "[Plugin] Context for {domain}: response={}, ipv4={}, ipv6={}",
            fetch.response.is_some(),
            ipv4.len(),
            ipv6.len()
        );
        Self::new(domain, fetch, ipv4, ipv6)
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// The homepage response, absent when neither HTTPS nor HTTP answered.
    pub fn response(&self) -> Option<&HttpResponse> {
        self.response.as_ref()
    }

    pub fn has_ssl(&self) -> bool {
        self.has_ssl
    }

    pub fn connect_error(&self) -> Option<&str> {
        self.connect_error.as_deref()
    }

    pub fn ipv4_answers(&self) -> &DnsAnswerSet {
        &self.ipv4_answers
    }

    pub fn ipv6_answers(&self) -> &DnsAnswerSet {
        &self.ipv6_answers
    }

    pub fn meta_tags(&self) -> &BTreeMap<String, String> {
        &self.meta_tags
    }

    pub fn meta_tag(&self, key: &str) -> Option<&str> {
        self.meta_tags.get(key).map(String::as_str)
    }

    pub fn domain_details(&self) -> &DomainDetails {
        &self.domain_details
    }

    /// Registrable domain, or `""` when the name has none.
    pub fn registrable_domain(&self) -> &str {
        self.domain_details.registrable_domain.as_deref().unwrap_or_default()
    }

    /// All values of a response header joined by `", "`; empty without a response.
    pub fn header_line(&self, name: &str) -> String {
        self.response
            .as_ref()
            .map(|r| r.header_line(name))
            .unwrap_or_default()
    }
}

/// Answers the address chains gathered for the context's own domain, so
/// classifiers can run without querying again. Every other question gets an
/// empty answer set.
#[async_trait]
impl DnsGateway for ClassificationContext {
    async fn resolve(&self, name: &str, kind: RecordKind) -> DnsAnswerSet {
        if !name.eq_ignore_ascii_case(&self.domain) {
            return DnsAnswerSet::empty();
        }
        match kind {
            RecordKind::Cname => self.ipv4_answers.clone(),
            RecordKind::Aaaa => self.ipv6_answers.clone(),
            RecordKind::Ns => DnsAnswerSet::empty(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeDnsGateway, FakeHomepageFetcher};

    #[test]
    fn test_domain_details_icann() {
        let details = DomainDetails::resolve("www.health.gov.au");
        assert_eq!(details.registrable_domain.as_deref(), Some("health.gov.au"));
        assert_eq!(details.sub_domain.as_deref(), Some("www"));
        assert_eq!(details.public_suffix.as_deref(), Some("gov.au"));
        assert!(details.is_known);
        assert!(details.is_icann);
        assert!(!details.is_private);
    }

    #[test]
    fn test_domain_details_apex_has_no_subdomain() {
        let details = DomainDetails::resolve("example.com");
        assert_eq!(details.registrable_domain.as_deref(), Some("example.com"));
        assert!(details.sub_domain.is_none());
    }

    #[test]
    fn test_domain_details_ip() {
        let details = DomainDetails::resolve("1.2.3.4");
        assert!(details.registrable_domain.is_none());
        assert!(!details.is_known);
    }

    #[test]
    fn test_domain_details_serialises_icann_key() {
        let json = serde_json::to_value(DomainDetails::resolve("example.com")).unwrap();
        assert_eq!(json["isICANN"], true);
        assert_eq!(json["registrableDomain"], "example.com");
    }

    #[test]
    fn test_meta_tags() {
        let html = r#"<html><head>
            <META NAME="Generator" CONTENT="Drupal 9 (https://www.drupal.org)">
            <meta property='og:title' content='Tom &amp; Jerry'/>
            <meta http-equiv=X-UA-Compatible content=IE=edge>
            <meta charset="utf-8">
            <meta content="later" name="Generator">
        </head></html>"#;
        let tags = parse_meta_tags(html);
        assert_eq!(tags.get("Generator").map(String::as_str), Some("later"));
        assert_eq!(tags.get("og:title").map(String::as_str), Some("Tom & Jerry"));
        assert_eq!(tags.get("X-UA-Compatible").map(String::as_str), Some("IE=edge"));
        assert_eq!(tags.len(), 3);
    }

    #[test]
    fn test_decode_does_not_double_decode() {
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }

    #[tokio::test]
    async fn test_gather() {
        let homepage = FakeHomepageFetcher::new().with_response(
            "example.com",
            HttpResponse::new(
                "https://example.com/",
                200,
                &[("Server", "nginx")],
                r#"<meta name="generator" content="GovCMS">"#,
            ),
        );
        let dns = FakeDnsGateway::new()
            .with_answers("example.com", RecordKind::Cname, &["93.184.216.34"]);

        let ctx = ClassificationContext::gather("example.com", &homepage, &dns).await;
        assert!(ctx.has_ssl());
        assert_eq!(ctx.header_line("server"), "nginx");
        assert_eq!(ctx.meta_tag("generator"), Some("GovCMS"));
        assert_eq!(ctx.ipv4_answers().as_slice(), ["93.184.216.34"]);
        assert!(ctx.ipv6_answers().is_empty());
        assert_eq!(ctx.registrable_domain(), "example.com");
    }

    #[tokio::test]
    async fn test_replays_gathered_answers() {
        let ctx = ClassificationContext::new(
            "example.com",
            HomepageFetch::default(),
            ["d1.cloudfront.net.", "13.32.0.1"].into_iter().collect(),
            ["2600:9000::1"].into_iter().collect(),
        );
        assert_eq!(
            ctx.resolve("EXAMPLE.com", RecordKind::Cname).await.as_slice(),
            ["d1.cloudfront.net.", "13.32.0.1"]
        );
        assert_eq!(ctx.resolve("example.com", RecordKind::Aaaa).await.len(), 1);
        assert!(ctx.resolve("example.com", RecordKind::Ns).await.is_empty());
        assert!(ctx.resolve("other.com", RecordKind::Cname).await.is_empty());
    }

    #[test]
    fn test_without_response() {
        let ctx = ClassificationContext::new(
            "example.com",
            HomepageFetch {
                response: None,
                has_ssl: false,
                connect_error: Some("connection refused".to_string()),
            },
            DnsAnswerSet::empty(),
            DnsAnswerSet::empty(),
        );
        assert!(ctx.response().is_none());
        assert!(ctx.meta_tags().is_empty());
        assert_eq!(ctx.header_line("server"), "");
        assert_eq!(ctx.connect_error(), Some("connection refused"));
    }
}
