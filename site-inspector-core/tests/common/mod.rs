//! Shared fakes for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use site_inspector_core::error::{InspectorError, InspectorResult};
use site_inspector_core::traits::{
    CertificateSource, DnsGateway, DocumentFetcher, HomepageFetcher, WhoisSource,
};
use site_inspector_core::{Collaborators, InspectorConfig};
use site_inspector_toolbox::{
    CertificateFacts, DnsAnswerSet, HomepageFetch, HttpResponse, RecordKind, WhoisResult,
};

/// Resolver answering from a fixed table and counting every query.
#[derive(Default)]
pub struct TableDns {
    answers: HashMap<(String, RecordKind), Vec<String>>,
    queries: AtomicUsize,
}

impl TableDns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, name: &str, kind: RecordKind, answers: &[&str]) -> Self {
        self.answers.insert(
            (name.to_string(), kind),
            answers.iter().map(|a| (*a).to_string()).collect(),
        );
        self
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DnsGateway for TableDns {
    async fn resolve(&self, name: &str, kind: RecordKind) -> DnsAnswerSet {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.answers
            .get(&(name.to_string(), kind))
            .cloned()
            .map(DnsAnswerSet::new)
            .unwrap_or_default()
    }
}

/// Serves canned homepages; unknown domains refuse the connection.
#[derive(Default)]
pub struct CannedHomepages {
    pages: HashMap<String, HttpResponse>,
}

impl CannedHomepages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, domain: &str, status: u16, headers: &[(&str, &str)], body: &str) -> Self {
        self.pages.insert(
            domain.to_string(),
            HttpResponse::new(format!("https://{domain}/"), status, headers, body),
        );
        self
    }
}

#[async_trait]
impl HomepageFetcher for CannedHomepages {
    async fn fetch_homepage(&self, domain: &str) -> HomepageFetch {
        match self.pages.get(domain) {
            Some(response) => HomepageFetch {
                response: Some(response.clone()),
                has_ssl: true,
                connect_error: None,
            },
            None => HomepageFetch {
                response: None,
                has_ssl: false,
                connect_error: Some(format!("Connection refused: {domain}:443")),
            },
        }
    }
}

/// Remote documents by URL, counting fetches.
#[derive(Default)]
pub struct CannedDocuments {
    documents: HashMap<String, String>,
    fetches: AtomicUsize,
}

impl CannedDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(mut self, url: &str, body: &str) -> Self {
        self.documents.insert(url.to_string(), body.to_string());
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentFetcher for CannedDocuments {
    async fn fetch_document(&self, url: &str) -> InspectorResult<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| InspectorError::NetworkError(format!("{url} unavailable")))
    }
}

pub struct NoWhois;

#[async_trait]
impl WhoisSource for NoWhois {
    async fn lookup(&self, domain: &str) -> InspectorResult<WhoisResult> {
        Err(InspectorError::NetworkError(format!("No WHOIS server for {domain}")))
    }
}

pub struct NoCertificates;

#[async_trait]
impl CertificateSource for NoCertificates {
    async fn certificate(&self, host: &str) -> InspectorResult<CertificateFacts> {
        Err(InspectorError::NetworkError(format!("{host}:443 refused the handshake")))
    }
}

pub fn collaborators(
    dns: Arc<TableDns>,
    homepages: CannedHomepages,
    documents: Arc<CannedDocuments>,
) -> Collaborators {
    Collaborators::new(
        dns,
        Arc::new(homepages),
        documents,
        Arc::new(NoWhois),
        Arc::new(NoCertificates),
    )
}

/// Defaults with the cache in `dir` and feeds at fake URLs.
pub fn config(dir: &std::path::Path) -> InspectorConfig {
    InspectorConfig {
        cache_dir: dir.to_path_buf(),
        amazon_ranges_url: "https://ranges.test/amazon.json".to_string(),
        azure_ranges_url: "https://ranges.test/azure.json".to_string(),
        ..InspectorConfig::default()
    }
}

pub const AMAZON_RANGES: &str = r#"{
    "syncToken": "1",
    "prefixes": [
        {"ip_prefix": "13.32.0.0/15", "region": "GLOBAL", "service": "AMAZON"},
        {"ip_prefix": "13.32.0.0/15", "region": "GLOBAL", "service": "CLOUDFRONT"},
        {"ip_prefix": "3.24.0.0/14", "region": "ap-southeast-2", "service": "EC2"}
    ],
    "ipv6_prefixes": [
        {"ipv6_prefix": "2600:9000::/28", "region": "GLOBAL", "service": "CLOUDFRONT"}
    ]
}"#;

pub const AZURE_RANGES: &str = r#"{
    "changeNumber": 1,
    "values": [
        {"name": "AzureFrontDoor.Frontend", "id": "x",
         "properties": {"addressPrefixes": ["13.107.246.0/24"]}}
    ]
}"#;
