//! Collaborator seams.
//!
//! Every network-facing dependency of the engine sits behind one of these
//! traits so the classifier and the plugins can be driven by in-memory fakes.

mod certificate_source;
mod dns_gateway;
mod document_fetcher;
mod homepage_fetcher;
mod whois_source;

pub use certificate_source::{CertificateSource, ToolboxCertificates};
pub use dns_gateway::DnsGateway;
pub use document_fetcher::{DocumentFetcher, HttpDocumentFetcher};
pub use homepage_fetcher::HomepageFetcher;
pub use whois_source::{ToolboxWhois, WhoisSource};
