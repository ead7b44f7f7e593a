//! Network collaborators for site-inspector.
//!
//! DNS queries against a fixed resolver, the homepage fetch, WHOIS and TLS
//! certificate inspection. Nothing here knows about classification.

mod error;
mod services;
mod types;

pub use error::{ToolboxError, ToolboxResult};
pub use services::{
    DEFAULT_DNS_TIMEOUT, DEFAULT_NAMESERVER, DnsClient, HttpClient, HttpOptions, ToolboxService,
    validate_domain,
};
pub use types::{
    CertificateFacts, DnsAnswerSet, HomepageFetch, HttpHeader, HttpResponse, RecordKind,
    WhoisResult,
};
