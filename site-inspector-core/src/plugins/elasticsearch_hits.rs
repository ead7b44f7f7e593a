//! Router hit counts for the domain's OpenShift namespace.

use std::path::Path;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::Plugin;
use super::backend::header_namespace;
use crate::context::ClassificationContext;
use crate::error::{InspectorError, InspectorResult};

/// Snapshot written by the hits scraper, keyed by namespace. Each entry holds
/// the origin hit and time counters for the last 30 days and any per-hostname
/// page view counts.
#[derive(Debug, Clone, Default)]
pub struct RouterHits {
    namespaces: Map<String, Value>,
}

impl RouterHits {
    pub fn parse(json: &str) -> InspectorResult<Self> {
        let namespaces = serde_json::from_str(json)
            .map_err(|e| InspectorError::ParseError(format!("Router hits: {e}")))?;
        Ok(Self { namespaces })
    }

    /// A configured snapshot that cannot be read is a configuration error.
    pub fn load(path: &Path) -> InspectorResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            InspectorError::ConfigError(format!("Cannot read router hits {}: {e}", path.display()))
        })?;
        Self::parse(&json).map_err(|e| InspectorError::ConfigError(format!("{}: {e}", path.display())))
    }

    pub fn get(&self, namespace: &str) -> Option<&Value> {
        self.namespaces.get(namespace)
    }

    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }
}

/// Hits for the namespace in `X-Lagoon`; `{}` without the header, the
/// snapshot or an entry.
pub struct ElasticsearchHitsPlugin {
    hits: Option<RouterHits>,
}

impl ElasticsearchHitsPlugin {
    pub fn new(hits: Option<RouterHits>) -> Self {
        Self { hits }
    }
}

#[async_trait]
impl Plugin for ElasticsearchHitsPlugin {
    fn machine_name(&self) -> &'static str {
        "elasticsearchHits"
    }

    async fn analyse(&self, ctx: &ClassificationContext) -> InspectorResult<Value> {
        let entry = self
            .hits
            .as_ref()
            .zip(header_namespace(ctx))
            .and_then(|(hits, namespace)| hits.get(&namespace).cloned());
        Ok(entry.unwrap_or_else(|| Value::Object(Map::new())))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use site_inspector_toolbox::{DnsAnswerSet, HomepageFetch, HttpResponse};

    use super::*;

    const SNAPSHOT: &str = r#"{
        "health-master": {
            "www.health.gov.au": {"30days": 1200, "30daysPercent": 2.5},
            "30daysOriginHits": 48213,
            "30daysOriginHitsPercent": 1.75,
            "30daysOriginTime": 901,
            "30daysOriginTimePercent": 0.4
        }
    }"#;

    fn ctx(headers: &[(&str, &str)]) -> ClassificationContext {
        ClassificationContext::new(
            "www.health.gov.au",
            HomepageFetch {
                response: Some(HttpResponse::new("https://www.health.gov.au/", 200, headers, "")),
                has_ssl: true,
                connect_error: None,
            },
            DnsAnswerSet::empty(),
            DnsAnswerSet::empty(),
        )
    }

    fn plugin() -> ElasticsearchHitsPlugin {
        ElasticsearchHitsPlugin::new(Some(RouterHits::parse(SNAPSHOT).unwrap()))
    }

    #[tokio::test]
    async fn test_hits_for_header_namespace() {
        let value = plugin()
            .analyse(&ctx(&[(
                "X-Lagoon",
                "lb6827.govcms1.amazee.io>health-master:www.health.gov.au",
            )]))
            .await
            .unwrap();
        assert_eq!(value["30daysOriginHits"], 48213);
        assert_eq!(value["www.health.gov.au"]["30days"], 1200);
    }

    #[tokio::test]
    async fn test_no_header_is_empty() {
        assert_eq!(plugin().analyse(&ctx(&[])).await.unwrap(), json!({}));
    }

    #[tokio::test]
    async fn test_unknown_namespace_is_empty() {
        let value = plugin()
            .analyse(&ctx(&[("X-Lagoon", "lb1.govcms1.amazee.io>other-master:x")]))
            .await
            .unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn test_load_rejects_non_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hits.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(RouterHits::load(&path), Err(InspectorError::ConfigError(_))));
        assert!(RouterHits::load(&dir.path().join("missing.json")).is_err());
    }
}
