//! Classifier plugins and their registry.
//!
//! Every plugin reads the shared [`ClassificationContext`] and contributes
//! one JSON value under its machine name. The registry fixes both the set of
//! plugins and the order their results appear in the report.

mod backend;
mod caching_headers;
mod cms;
mod edge;
mod elasticsearch_hits;
mod nameservers;
mod openshift_project;
mod redirect;
mod response;
mod security_headers;
mod ssl;
mod whois;

use std::sync::Arc;

use async_trait::async_trait;
use log::warn;
use serde::Serialize;
use serde_json::Value;

use crate::cache::MonthlyFileCache;
use crate::context::ClassificationContext;
use crate::edge::EdgeClassifier;
use crate::error::{InspectorError, InspectorResult};
use crate::traits::{CertificateSource, DnsGateway, WhoisSource};

pub use backend::{BackendPlugin, BackendReport, OpenshiftProjects, lagoon_cluster, lagoon_namespace};
pub use caching_headers::{CachingHeadersPlugin, CachingReport, friendly_duration};
pub use cms::CmsPlugin;
pub use edge::EdgePlugin;
pub use elasticsearch_hits::{ElasticsearchHitsPlugin, RouterHits};
pub use nameservers::{NameserversPlugin, dns_provider};
pub use openshift_project::OpenshiftProjectPlugin;
pub use redirect::RedirectPlugin;
pub use response::{HttpAuthPlugin, PhpSessionPlugin, PoweredByPlugin};
pub use security_headers::{SecurityHeaders, SecurityHeadersPlugin};
pub use ssl::SslPlugin;
pub use whois::WhoisPlugin;

/// An independent classifier.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Stable key of this plugin's result in the report.
    fn machine_name(&self) -> &'static str;

    /// Missing data (no response, no answers) yields the plugin's neutral
    /// result rather than an error.
    async fn analyse(&self, ctx: &ClassificationContext) -> InspectorResult<Value>;
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> InspectorResult<Value> {
    serde_json::to_value(value)
        .map_err(|e| InspectorError::ParseError(format!("Cannot serialise plugin result: {e}")))
}

/// Collaborators the built-in plugins need.
#[derive(Clone)]
pub struct PluginDeps {
    pub edge: Arc<EdgeClassifier>,
    pub dns: Arc<dyn DnsGateway>,
    pub whois: Arc<dyn WhoisSource>,
    pub certificates: Arc<dyn CertificateSource>,
    pub cache: MonthlyFileCache,
    pub openshift_projects: Option<OpenshiftProjects>,
    pub router_hits: Option<RouterHits>,
}

/// Ordered set of plugins, keyed by machine name.
#[derive(Default, Clone)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in plugins in report order.
    pub fn standard(deps: PluginDeps) -> Self {
        Self::new()
            .register(BackendPlugin::new(deps.openshift_projects.clone()))
            .register(CmsPlugin)
            .register(CachingHeadersPlugin)
            .register(EdgePlugin::new(deps.edge))
            .register(ElasticsearchHitsPlugin::new(deps.router_hits))
            .register(HttpAuthPlugin)
            .register(NameserversPlugin::new(deps.dns))
            .register(OpenshiftProjectPlugin::new(deps.openshift_projects))
            .register(PhpSessionPlugin)
            .register(PoweredByPlugin)
            .register(RedirectPlugin)
            .register(SecurityHeadersPlugin)
            .register(SslPlugin::new(deps.certificates))
            .register(WhoisPlugin::new(deps.whois, deps.cache))
    }

    /// Append a plugin. A plugin reusing a registered machine name takes the
    /// earlier one's place.
    #[must_use]
    pub fn register(mut self, plugin: impl Plugin + 'static) -> Self {
        let plugin: Arc<dyn Plugin> = Arc::new(plugin);
        let name = plugin.machine_name();
        if let Some(slot) = self.plugins.iter_mut().find(|p| p.machine_name() == name) {
            warn!("[Plugin] Replacing registered plugin '{name}'");
            *slot = plugin;
        } else {
            self.plugins.push(plugin);
        }
        self
    }

    pub fn machine_names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|p| p.machine_name()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Plugin>> {
        self.plugins.iter().find(|p| p.machine_name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Plugin>> {
        self.plugins.iter()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Keep only the named plugins, in registration order.
    pub fn retain_named(&self, names: &[String]) -> InspectorResult<Self> {
        if let Some(unknown) = names.iter().find(|n| self.get(n).is_none()) {
            return Err(InspectorError::ValidationError(format!(
                "Unknown plugin '{unknown}', expected one of: {}",
                self.machine_names().join(", ")
            )));
        }
        Ok(Self {
            plugins: self
                .plugins
                .iter()
                .filter(|p| names.iter().any(|n| n == p.machine_name()))
                .cloned()
                .collect(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ranges::RangeRegistry;
    use crate::rules::RuleTable;
    use crate::test_utils::{FakeCertificates, FakeDnsGateway, FakeWhois};

    fn deps() -> PluginDeps {
        let dns = Arc::new(FakeDnsGateway::new());
        let rules = RuleTable::standard(Arc::new(RangeRegistry::curated())).unwrap();
        PluginDeps {
            edge: Arc::new(EdgeClassifier::new(Arc::new(rules))),
            dns,
            whois: Arc::new(FakeWhois::new()),
            certificates: Arc::new(FakeCertificates::new()),
            cache: MonthlyFileCache::new(std::env::temp_dir()),
            openshift_projects: None,
            router_hits: None,
        }
    }

    struct Named(&'static str);

    #[async_trait]
    impl Plugin for Named {
        fn machine_name(&self) -> &'static str {
            self.0
        }

        async fn analyse(&self, _ctx: &ClassificationContext) -> InspectorResult<Value> {
            Ok(Value::Null)
        }
    }

    #[test]
    fn test_standard_order() {
        assert_eq!(
            PluginRegistry::standard(deps()).machine_names(),
            [
                "backend",
                "cms",
                "CachingHeaders",
                "edge",
                "elasticsearchHits",
                "hasHttpAuth",
                "nameservers",
                "openshiftProject",
                "phpsession",
                "poweredBy",
                "redirect",
                "securityHeaders",
                "ssl",
                "whois",
            ]
        );
    }

    #[test]
    fn test_register_replaces_in_place() {
        let registry = PluginRegistry::new()
            .register(Named("a"))
            .register(Named("b"))
            .register(Named("a"));
        assert_eq!(registry.machine_names(), ["a", "b"]);
    }

    #[test]
    fn test_retain_named() {
        let registry = PluginRegistry::standard(deps());
        let subset = registry
            .retain_named(&["whois".to_string(), "edge".to_string()])
            .unwrap();
        assert_eq!(subset.machine_names(), ["edge", "whois"]);

        assert!(matches!(
            registry.retain_named(&["alexa".to_string()]),
            Err(InspectorError::ValidationError(_))
        ));
    }
}
