//! Plugin orchestration: one report per domain.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, error, info, warn};
use serde::Serialize;
use serde_json::{Map, Value};
use site_inspector_toolbox::{DnsAnswerSet, DnsClient, HttpClient, HttpOptions, validate_domain};

use crate::cache::MonthlyFileCache;
use crate::config::InspectorConfig;
use crate::context::{ClassificationContext, DomainDetails};
use crate::edge::EdgeClassifier;
use crate::error::{InspectorError, InspectorResult};
use crate::plugins::{OpenshiftProjects, PluginDeps, PluginRegistry, RouterHits};
use crate::ranges::RangeRegistry;
use crate::rules::RuleTable;
use crate::traits::{
    CertificateSource, DnsGateway, DocumentFetcher, HomepageFetcher, HttpDocumentFetcher,
    ToolboxCertificates, ToolboxWhois, WhoisSource,
};

/// Network-facing dependencies of an [`Inspector`].
#[derive(Clone)]
pub struct Collaborators {
    pub dns: Arc<dyn DnsGateway>,
    pub homepage: Arc<dyn HomepageFetcher>,
    pub documents: Arc<dyn DocumentFetcher>,
    pub whois: Arc<dyn WhoisSource>,
    pub certificates: Arc<dyn CertificateSource>,
}

impl Collaborators {
    #[must_use]
    pub fn new(
        dns: Arc<dyn DnsGateway>,
        homepage: Arc<dyn HomepageFetcher>,
        documents: Arc<dyn DocumentFetcher>,
        whois: Arc<dyn WhoisSource>,
        certificates: Arc<dyn CertificateSource>,
    ) -> Self {
        Self {
            dns,
            homepage,
            documents,
            whois,
            certificates,
        }
    }

    /// The real network clients, configured from `config`.
    pub fn from_config(config: &InspectorConfig) -> InspectorResult<Self> {
        let dns = DnsClient::new(config.nameserver_addr()?, config.dns_timeout());
        let http = HttpClient::new(&HttpOptions {
            connect_timeout: config.connect_timeout(),
            request_timeout: config.request_timeout(),
            user_agent: config.user_agent.clone(),
        })?;

        Ok(Self::new(
            Arc::new(dns),
            Arc::new(http.clone()),
            Arc::new(HttpDocumentFetcher::new(http, config.request_timeout())),
            Arc::new(ToolboxWhois::new(config.request_timeout())),
            Arc::new(ToolboxCertificates::new(config.request_timeout())),
        ))
    }
}

/// Everything learned about one domain.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub domain: String,
    pub has_ssl: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_error: Option<String>,
    pub domain_details: DomainDetails,
    pub ipv4_records: DnsAnswerSet,
    pub ipv6_records: DnsAnswerSet,
    pub metatags: BTreeMap<String, String>,
    pub is_lagoon: bool,
    /// Plugin results keyed by machine name, in registration order.
    #[serde(flatten)]
    pub plugins: Map<String, Value>,
}

impl AnalysisReport {
    pub fn plugin(&self, name: &str) -> Option<&Value> {
        self.plugins.get(name)
    }
}

/// Runs the registered plugins against a domain.
///
/// Built once per process: the range snapshot and rule table are shared by
/// every analysis.
pub struct Inspector {
    config: InspectorConfig,
    collaborators: Collaborators,
    plugins: PluginRegistry,
}

impl Inspector {
    /// Validate `config`, load this month's provider ranges and register the
    /// standard plugins.
    pub async fn build(config: InspectorConfig, collaborators: Collaborators) -> InspectorResult<Self> {
        config.validate()?;
        let cache = MonthlyFileCache::new(&config.cache_dir);
        let ranges = RangeRegistry::load(&config, &cache, collaborators.documents.as_ref()).await;
        Self::new(config, collaborators, Arc::new(ranges))
    }

    /// Like [`Inspector::build`] with an already loaded range snapshot.
    pub fn new(
        config: InspectorConfig,
        collaborators: Collaborators,
        ranges: Arc<RangeRegistry>,
    ) -> InspectorResult<Self> {
        let cache = MonthlyFileCache::new(&config.cache_dir);
        let rules = RuleTable::standard(ranges)?;
        let edge = EdgeClassifier::new(Arc::new(rules));

        let openshift_projects = config
            .openshift_projects_file
            .as_deref()
            .map(OpenshiftProjects::load)
            .transpose()?;
        if let Some(projects) = &openshift_projects {
            info!("[Plugin] Loaded {} OpenShift projects", projects.len());
        }

        let router_hits = config
            .hits_file
            .as_deref()
            .map(RouterHits::load)
            .transpose()?;
        if let Some(hits) = &router_hits {
            info!("[Plugin] Loaded router hits for {} namespaces", hits.len());
        }

        let plugins = PluginRegistry::standard(PluginDeps {
            edge: Arc::new(edge),
            dns: collaborators.dns.clone(),
            whois: collaborators.whois.clone(),
            certificates: collaborators.certificates.clone(),
            cache,
            openshift_projects,
            router_hits,
        });

        Ok(Self {
            config,
            collaborators,
            plugins,
        })
    }

    /// Replace the plugin set.
    #[must_use]
    pub fn with_plugins(mut self, plugins: PluginRegistry) -> Self {
        self.plugins = plugins;
        self
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    pub fn config(&self) -> &InspectorConfig {
        &self.config
    }

    /// Analyse `domain` with every registered plugin.
    pub async fn analyse(&self, domain: &str) -> InspectorResult<AnalysisReport> {
        self.run(domain, &self.plugins).await
    }

    /// Analyse `domain` with the named plugins only.
    pub async fn analyse_only(&self, domain: &str, names: &[String]) -> InspectorResult<AnalysisReport> {
        let plugins = self.plugins.retain_named(names)?;
        self.run(domain, &plugins).await
    }

    async fn run(&self, domain: &str, plugins: &PluginRegistry) -> InspectorResult<AnalysisReport> {
        let domain = validate_domain(domain)?;
        let ctx = ClassificationContext::gather(
            &domain,
            self.collaborators.homepage.as_ref(),
            self.collaborators.dns.as_ref(),
        )
        .await;

        let budget = self.config.plugin_timeout();
        let mut results = Map::new();
        for plugin in plugins.iter() {
            let name = plugin.machine_name();
            let value = match tokio::time::timeout(budget, plugin.analyse(&ctx)).await {
                Ok(Ok(value)) => value,
                Ok(Err(e)) => {
                    if e.is_expected() {
                        warn!("[Plugin] {name} failed for {domain}: {e}");
                    } else {
                        error!("[Plugin] {name} failed for {domain}: {e}");
                    }
                    Value::Null
                }
                Err(_) => {
                    let e = InspectorError::PluginTimeout {
                        plugin: name.to_string(),
                        seconds: budget.as_secs(),
                    };
                    warn!("[Plugin] {e} for {domain}");
                    Value::Null
                }
            };
            debug!("[Plugin] {name} done for {domain}");
            results.insert(name.to_string(), value);
        }

        let is_lagoon = results
            .get("backend")
            .and_then(|backend| backend.get("isLagoon"))
            .and_then(Value::as_bool)
            .unwrap_or(false);

        Ok(AnalysisReport {
            domain: ctx.domain().to_string(),
            has_ssl: ctx.has_ssl(),
            connect_error: ctx.connect_error().map(str::to_string),
            domain_details: ctx.domain_details().clone(),
            ipv4_records: ctx.ipv4_answers().clone(),
            ipv6_records: ctx.ipv6_answers().clone(),
            metatags: ctx.meta_tags().clone(),
            is_lagoon,
            plugins: results,
        })
    }
}
