//! In-memory collaborators for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use site_inspector_toolbox::{
    CertificateFacts, DnsAnswerSet, HomepageFetch, HttpResponse, RecordKind, WhoisResult,
};

use crate::error::{InspectorError, InspectorResult};
use crate::traits::{
    CertificateSource, DnsGateway, DocumentFetcher, HomepageFetcher, WhoisSource,
};

// ===== FakeDnsGateway =====

#[derive(Default)]
pub struct FakeDnsGateway {
    answers: HashMap<(String, RecordKind), Vec<String>>,
    calls: AtomicUsize,
}

impl FakeDnsGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answers(mut self, name: &str, kind: RecordKind, answers: &[&str]) -> Self {
        self.answers.insert(
            (name.to_string(), kind),
            answers.iter().map(|a| (*a).to_string()).collect(),
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DnsGateway for FakeDnsGateway {
    async fn resolve(&self, name: &str, kind: RecordKind) -> DnsAnswerSet {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answers
            .get(&(name.to_string(), kind))
            .cloned()
            .map(DnsAnswerSet::new)
            .unwrap_or_default()
    }
}

// ===== FakeHomepageFetcher =====

#[derive(Default)]
pub struct FakeHomepageFetcher {
    pages: HashMap<String, HomepageFetch>,
}

impl FakeHomepageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `response` over HTTPS.
    pub fn with_response(self, domain: &str, response: HttpResponse) -> Self {
        self.with_fetch(
            domain,
            HomepageFetch {
                response: Some(response),
                has_ssl: true,
                connect_error: None,
            },
        )
    }

    pub fn with_fetch(mut self, domain: &str, fetch: HomepageFetch) -> Self {
        self.pages.insert(domain.to_string(), fetch);
        self
    }
}

#[async_trait]
impl HomepageFetcher for FakeHomepageFetcher {
    async fn fetch_homepage(&self, domain: &str) -> HomepageFetch {
        self.pages.get(domain).cloned().unwrap_or_else(|| HomepageFetch {
            response: None,
            has_ssl: false,
            connect_error: Some(format!("Could not resolve host: {domain}")),
        })
    }
}

// ===== FakeDocumentFetcher =====

#[derive(Default)]
pub struct FakeDocumentFetcher {
    documents: HashMap<String, String>,
    calls: AtomicUsize,
}

impl FakeDocumentFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, url: &str, body: &str) -> Self {
        self.documents.insert(url.to_string(), body.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentFetcher for FakeDocumentFetcher {
    async fn fetch_document(&self, url: &str) -> InspectorResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| InspectorError::NetworkError(format!("HTTP 404 from {url}")))
    }
}

// ===== FakeWhois =====

#[derive(Default)]
pub struct FakeWhois {
    records: HashMap<String, WhoisResult>,
    calls: AtomicUsize,
}

impl FakeWhois {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, record: WhoisResult) -> Self {
        self.records.insert(record.domain.clone(), record);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WhoisSource for FakeWhois {
    async fn lookup(&self, domain: &str) -> InspectorResult<WhoisResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.records
            .get(domain)
            .cloned()
            .ok_or_else(|| InspectorError::NetworkError(format!("No WHOIS server answered for {domain}")))
    }
}

// ===== FakeCertificates =====

#[derive(Default)]
pub struct FakeCertificates {
    certificates: HashMap<String, CertificateFacts>,
}

impl FakeCertificates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_certificate(mut self, host: &str, facts: CertificateFacts) -> Self {
        self.certificates.insert(host.to_string(), facts);
        self
    }
}

#[async_trait]
impl CertificateSource for FakeCertificates {
    async fn certificate(&self, host: &str) -> InspectorResult<CertificateFacts> {
        self.certificates
            .get(host)
            .cloned()
            .ok_or_else(|| InspectorError::NetworkError(format!("{host}:443 refused the handshake")))
    }
}

/// Certificate facts for a healthy Let's Encrypt leaf.
pub fn sample_certificate(host: &str) -> CertificateFacts {
    CertificateFacts {
        days_until_expiration_date: 60,
        domains: vec![host.to_string()],
        expiration_date: "2026-12-16".to_string(),
        fingerprint: "ab".repeat(32),
        issuer: "Let's Encrypt R11".to_string(),
        is_valid: true,
        lifespan_in_days: 90,
        organization: Some("Let's Encrypt".to_string()),
        signature_algorithm: "RSA-SHA256".to_string(),
        uses_sha1_hash: false,
        valid_from_date: "2026-09-17".to_string(),
    }
}
