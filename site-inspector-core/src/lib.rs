//! Site Inspector Core Library
//!
//! Classifies what sits in front of a website and what serves it:
//! - Provider IP range registries with a monthly document cache
//! - The ordered edge rule table and the DNS chain walking classifier
//! - The shared classification context and the plugin orchestrator
//!
//! All network access goes through the traits in [`traits`], so the engine
//! can be driven by in-memory collaborators.

pub mod cache;
pub mod config;
pub mod context;
pub mod edge;
pub mod error;
pub mod inspector;
pub mod plugins;
pub mod ranges;
pub mod rules;
pub mod traits;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use cache::MonthlyFileCache;
pub use config::InspectorConfig;
pub use context::{ClassificationContext, DomainDetails};
pub use edge::{EdgeClassifier, EdgeReport};
pub use error::{InspectorError, InspectorResult};
pub use inspector::{AnalysisReport, Collaborators, Inspector};
pub use plugins::{Plugin, PluginRegistry};
pub use ranges::{Provider, RangeRegistry};
pub use rules::{EdgeMatch, HopClassifier, RuleTable};
pub use traits::{CertificateSource, DnsGateway, DocumentFetcher, HomepageFetcher, WhoisSource};
