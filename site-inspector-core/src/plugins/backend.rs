//! Hosting backend detection.

use std::path::Path;
use std::sync::LazyLock;

use async_trait::async_trait;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Plugin, to_json};
use crate::context::ClassificationContext;
use crate::error::{InspectorError, InspectorResult};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenshiftProject {
    #[serde(default)]
    cluster_name: String,
    #[serde(default)]
    routes: Vec<OpenshiftRoute>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenshiftRoute {
    host: String,
}

#[derive(Debug, Clone)]
struct ProjectEntry {
    namespace: String,
    project: OpenshiftProject,
    record: Value,
}

/// Snapshot of OpenShift namespaces and their routes, as written by the
/// cluster scraper: `{ "<namespace>": { "clusterName", "routes": [{ "host" }], ... } }`.
/// Each project's full record is kept alongside the fields read here.
#[derive(Debug, Clone, Default)]
pub struct OpenshiftProjects {
    projects: Vec<ProjectEntry>,
}

impl OpenshiftProjects {
    pub fn parse(json: &str) -> InspectorResult<Self> {
        let raw: serde_json::Map<String, Value> = serde_json::from_str(json)
            .map_err(|e| InspectorError::ParseError(format!("OpenShift projects: {e}")))?;
        let projects = raw
            .into_iter()
            .map(|(namespace, record)| {
                OpenshiftProject::deserialize(&record)
                    .map_err(|e| {
                        InspectorError::ParseError(format!("OpenShift project {namespace}: {e}"))
                    })
                    .map(|project| ProjectEntry {
                        namespace,
                        project,
                        record,
                    })
            })
            .collect::<InspectorResult<_>>()?;
        Ok(Self { projects })
    }

    /// A configured snapshot that cannot be read is a configuration error.
    pub fn load(path: &Path) -> InspectorResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            InspectorError::ConfigError(format!(
                "Cannot read OpenShift projects {}: {e}",
                path.display()
            ))
        })?;
        Self::parse(&json).map_err(|e| InspectorError::ConfigError(format!("{}: {e}", path.display())))
    }

    fn serving(&self, host: &str) -> Option<&ProjectEntry> {
        self.projects
            .iter()
            .find(|entry| entry.project.routes.iter().any(|route| route.host == host))
    }

    /// Namespace and cluster name of the first route serving `host`.
    pub fn find_route(&self, host: &str) -> Option<(&str, &str)> {
        self.serving(host)
            .map(|entry| (entry.namespace.as_str(), entry.project.cluster_name.as_str()))
    }

    /// The scraped record of `namespace`.
    pub fn record(&self, namespace: &str) -> Option<&Value> {
        self.projects
            .iter()
            .find(|entry| entry.namespace == namespace)
            .map(|entry| &entry.record)
    }

    /// The scraped record of the first project with a route serving `host`.
    pub fn record_for_host(&self, host: &str) -> Option<&Value> {
        self.serving(host).map(|entry| &entry.record)
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

static ROUTED_NAMESPACE_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r">(?:nginx|varnish)-\d+-(?:[a-z0-9]+)-([a-z]+)-([a-zA-Z0-9_-]+)>").ok()
});

static BASIC_NAMESPACE_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r">([a-zA-Z0-9_-]+):").ok());

/// OpenShift namespace named in an `X-Lagoon` header.
///
/// `lb6827.govcms1.amazee.io>casa-master:www.casa.gov.au` gives
/// `casa-master`; `lb1400.bi.amazee.io>varnish-20-4cq2t-master-nbi-portal>nginx-32-dtwnq`
/// gives `nbi-portal-master`.
pub fn lagoon_namespace(header: &str) -> String {
    if let Some(caps) = ROUTED_NAMESPACE_RE.as_ref().and_then(|re| re.captures(header)) {
        return format!("{}-{}", &caps[2], &caps[1]);
    }
    BASIC_NAMESPACE_RE
        .as_ref()
        .and_then(|re| re.captures(header))
        .map(|caps| caps[1].to_string())
        .unwrap_or_default()
}

/// Namespace named by the response's `X-Lagoon` header, if any.
pub(crate) fn header_namespace(ctx: &ClassificationContext) -> Option<String> {
    let namespace = lagoon_namespace(&ctx.header_line("X-Lagoon"));
    (!namespace.is_empty()).then_some(namespace)
}

const LAGOON_CLUSTERS: &[(&str, &str)] = &[
    (".govcms1.amazee.io>", "GovCMS Lagoon"),
    (".vicsdp1.amazee.io>", "Victoria SDP Lagoon"),
    (".bi.amazee.io>", "BI1 Lagoon"),
    (".ch1.amazee.io>", "CH1 Lagoon"),
    (".au1.amazee.io>", "AU1 Lagoon"),
    (".us1.amazee.io>", "US1 Lagoon"),
];

/// Friendly Lagoon cluster name from an `X-Lagoon` header.
pub fn lagoon_cluster(header: &str) -> String {
    LAGOON_CLUSTERS
        .iter()
        .find(|(marker, _)| header.contains(marker))
        .map_or("amazee.io Lagoon", |(_, name)| name)
        .to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendReport {
    pub backend: String,
    pub server: String,
    pub is_lagoon: bool,
    pub openshift_project: String,
    pub lagoon_cluster: String,
    pub is_pantheon: bool,
    pub is_acquia_cloud_site_factory: bool,
    pub is_acquia_cloud: bool,
    pub is_platform_sh: bool,
    pub openshift_error: bool,
}

pub struct BackendPlugin {
    projects: Option<OpenshiftProjects>,
}

impl BackendPlugin {
    pub fn new(projects: Option<OpenshiftProjects>) -> Self {
        Self { projects }
    }

    pub fn detect(&self, ctx: &ClassificationContext) -> BackendReport {
        let server = ctx.header_line("Server");
        let lagoon = ctx.header_line("X-Lagoon");
        let acquia = ctx.header_line("x-ah-environment");

        let mut report = BackendReport {
            backend: server.clone(),
            server,
            openshift_error: ctx.header_line("x-openshift-error").trim() == "1",
            ..BackendReport::default()
        };

        if !lagoon.is_empty() {
            report.backend = "Lagoon".to_string();
            report.is_lagoon = true;
            report.openshift_project = lagoon_namespace(&lagoon);
            report.lagoon_cluster = lagoon_cluster(&lagoon);
        } else if !ctx.header_line("x-pantheon-styx-hostname").is_empty() {
            report.backend = "Pantheon".to_string();
            report.is_pantheon = true;
        } else if !acquia.is_empty() {
            if acquia.starts_with(|c: char| c.is_ascii_digit()) {
                report.backend = "Acquia Cloud Site Factory".to_string();
                report.is_acquia_cloud_site_factory = true;
            } else {
                report.backend = "Acquia Cloud".to_string();
                report.is_acquia_cloud = true;
            }
        } else if !ctx.header_line("x-platform-cluster").is_empty() {
            report.backend = "Platform.sh".to_string();
            report.is_platform_sh = true;
        }

        if report.openshift_project.is_empty()
            && let Some((namespace, cluster)) = self
                .projects
                .as_ref()
                .and_then(|projects| projects.find_route(ctx.domain()))
        {
            debug!("[Plugin] {} routed by OpenShift namespace {namespace}", ctx.domain());
            report.openshift_project = namespace.to_string();
            report.lagoon_cluster = format!("{cluster} Lagoon");
            report.is_lagoon = true;
        }

        report
    }
}

#[async_trait]
impl Plugin for BackendPlugin {
    fn machine_name(&self) -> &'static str {
        "backend"
    }

    async fn analyse(&self, ctx: &ClassificationContext) -> InspectorResult<Value> {
        to_json(&self.detect(ctx))
    }
}
