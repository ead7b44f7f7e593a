//! Public types returned by toolbox operations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Record types the DNS gateway answers for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordKind {
    /// The address chain of a name: every CNAME hop followed by the terminal
    /// IPv4 literals, the same lines `dig +short` prints.
    Cname,
    /// The IPv6 address chain of a name, CNAME hops included.
    Aaaa,
    /// Name server targets.
    Ns,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cname => write!(f, "CNAME"),
            Self::Aaaa => write!(f, "AAAA"),
            Self::Ns => write!(f, "NS"),
        }
    }
}

/// Ordered answers for one query. The first answer is tried first; an empty
/// set is a normal outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DnsAnswerSet(Vec<String>);

impl DnsAnswerSet {
    #[must_use]
    pub fn new(answers: Vec<String>) -> Self {
        Self(answers)
    }

    #[must_use]
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl<S: Into<String>> FromIterator<S> for DnsAnswerSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a DnsAnswerSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// An HTTP header name/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpHeader {
    /// Header name, as received.
    pub name: String,
    /// Header value.
    pub value: String,
}

/// A captured HTTP response: status, ordered headers and the decoded body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpResponse {
    /// URL that produced this response.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response headers in wire order. Repeated headers appear once per value.
    pub headers: Vec<HttpHeader>,
    /// Body decoded lossily as UTF-8.
    pub body: String,
}

impl HttpResponse {
    /// Build a response from `(name, value)` pairs.
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        status: u16,
        headers: &[(&str, &str)],
        body: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            status,
            headers: headers
                .iter()
                .map(|(name, value)| HttpHeader {
                    name: (*name).to_string(),
                    value: (*value).to_string(),
                })
                .collect(),
            body: body.into(),
        }
    }

    /// All values of a header, case-insensitive, in wire order.
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
            .collect()
    }

    /// All values of a header joined with `", "`; empty when absent.
    pub fn header_line(&self, name: &str) -> String {
        self.header_values(name).join(", ")
    }

    /// Whether the header is present with a non-empty value.
    pub fn has_header(&self, name: &str) -> bool {
        self.header_values(name).iter().any(|v| !v.is_empty())
    }
}

/// Outcome of fetching a domain's homepage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomepageFetch {
    /// The response, absent when neither HTTPS nor HTTP answered.
    pub response: Option<HttpResponse>,
    /// Whether the response came over HTTPS.
    pub has_ssl: bool,
    /// Why the HTTPS attempt failed, if it did.
    pub connect_error: Option<String>,
}

/// WHOIS registration facts for a registrable domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoisResult {
    /// The queried domain name.
    pub domain: String,
    /// Registrant organisation or name.
    pub owner: Option<String>,
    /// Domain registrar.
    pub registrar: Option<String>,
    /// Registration creation date.
    pub creation_date: Option<String>,
    /// Registration expiration date.
    pub expiration_date: Option<String>,
    /// Last updated date.
    pub updated_date: Option<String>,
    /// Authoritative name servers.
    pub name_servers: Vec<String>,
    /// EPP / registry state codes.
    pub states: Vec<String>,
}

/// Facts about the leaf certificate a host presents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateFacts {
    /// Days until the not-after date (negative once expired).
    pub days_until_expiration_date: i64,
    /// Common name followed by the DNS subject alternative names.
    pub domains: Vec<String>,
    /// Not-after date, `YYYY-MM-DD`.
    pub expiration_date: String,
    /// SHA-256 of the DER encoding, lowercase hex.
    pub fingerprint: String,
    /// Issuer common name, with Let's Encrypt intermediates spelled out.
    pub issuer: String,
    /// Within its validity window and issued for the queried host.
    pub is_valid: bool,
    /// Days between not-before and not-after.
    pub lifespan_in_days: i64,
    /// Issuing organisation, when present.
    pub organization: Option<String>,
    /// Signature algorithm short name (e.g. `"RSA-SHA256"`).
    pub signature_algorithm: String,
    /// Whether the signature uses SHA-1.
    pub uses_sha1_hash: bool,
    /// Not-before date, `YYYY-MM-DD`.
    pub valid_from_date: String,
}
