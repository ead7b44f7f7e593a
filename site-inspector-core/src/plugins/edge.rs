//! Edge network in front of the domain.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::{Plugin, to_json};
use crate::context::ClassificationContext;
use crate::edge::EdgeClassifier;
use crate::error::InspectorResult;

/// Classifies the address chains already resolved into the context. The
/// context answers the classifier's queries, so no new lookups are made.
pub struct EdgePlugin {
    classifier: Arc<EdgeClassifier>,
}

impl EdgePlugin {
    pub fn new(classifier: Arc<EdgeClassifier>) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl Plugin for EdgePlugin {
    fn machine_name(&self) -> &'static str {
        "edge"
    }

    async fn analyse(&self, ctx: &ClassificationContext) -> InspectorResult<Value> {
        let report = self
            .classifier
            .classify_domain(ctx.domain(), ctx, ctx.response())
            .await;
        to_json(&report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use site_inspector_toolbox::{DnsAnswerSet, HomepageFetch, HttpResponse};

    use super::*;
    use crate::ranges::RangeRegistry;
    use crate::rules::{OPS_NAME, RuleTable};

    fn plugin() -> EdgePlugin {
        let rules = RuleTable::standard(Arc::new(RangeRegistry::curated())).unwrap();
        EdgePlugin::new(Arc::new(EdgeClassifier::new(Arc::new(rules))))
    }

    #[tokio::test]
    async fn test_reports_camel_case_fields() {
        let ctx = ClassificationContext::new(
            "www.example.gov.au",
            HomepageFetch::default(),
            ["www.example.gov.au.cdn.cloudflare.net.", "104.16.1.1"].into_iter().collect(),
            DnsAnswerSet::empty(),
        );
        let value = plugin().analyse(&ctx).await.unwrap();
        assert_eq!(value["hasEdge"], true);
        assert_eq!(value["isOps"], false);
        assert_eq!(value["ipv6Valid"], false);
        assert_eq!(value["ipv6Text"], "No AAAA record");
    }

    #[tokio::test]
    async fn test_header_fallback_without_answers() {
        let ctx = ClassificationContext::new(
            "www.example.gov.au",
            HomepageFetch {
                response: Some(HttpResponse::new(
                    "https://www.example.gov.au/",
                    200,
                    &[("x-sucuri-id", "11005")],
                    "",
                )),
                has_ssl: true,
                connect_error: None,
            },
            DnsAnswerSet::empty(),
            DnsAnswerSet::empty(),
        );
        let value = plugin().analyse(&ctx).await.unwrap();
        assert_eq!(value["ipv4Text"], "Sucuri");
        assert_eq!(value["hasEdge"], true);
    }

    #[tokio::test]
    async fn test_govcms_edit_domain_ignores_answers() {
        let ctx = ClassificationContext::new(
            "health.govcms.gov.au",
            HomepageFetch::default(),
            ["104.16.1.1"].into_iter().collect(),
            DnsAnswerSet::empty(),
        );
        let value = plugin().analyse(&ctx).await.unwrap();
        assert_eq!(
            value,
            json!({
                "isOps": true,
                "hasEdge": true,
                "ipv4Text": OPS_NAME,
                "ipv6Valid": true,
                "ipv6Text": OPS_NAME,
            })
        );
    }
}
