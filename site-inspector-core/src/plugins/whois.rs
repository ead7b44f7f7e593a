//! Registration facts for the registrable domain, cached for the month.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::warn;
use serde_json::Value;
use site_inspector_toolbox::WhoisResult;

use super::{Plugin, to_json};
use crate::cache::MonthlyFileCache;
use crate::context::ClassificationContext;
use crate::error::{InspectorError, InspectorResult};
use crate::traits::WhoisSource;

pub struct WhoisPlugin {
    source: Arc<dyn WhoisSource>,
    cache: MonthlyFileCache,
}

impl WhoisPlugin {
    pub fn new(source: Arc<dyn WhoisSource>, cache: MonthlyFileCache) -> Self {
        Self { source, cache }
    }

    async fn record(&self, registrable: &str) -> InspectorResult<WhoisResult> {
        if registrable.is_empty() {
            return Err(InspectorError::ValidationError(
                "Domain has no registrable part".to_string(),
            ));
        }

        let source = &self.source;
        self.cache
            .get_or_fetch_with(
                &format!("whois-{registrable}"),
                Utc::now(),
                |json| {
                    serde_json::from_str(json)
                        .map_err(|e| InspectorError::ParseError(format!("Cached WHOIS record: {e}")))
                },
                move || async move {
                    let record = source.lookup(registrable).await?;
                    serde_json::to_string(&record)
                        .map_err(|e| InspectorError::ParseError(format!("WHOIS record: {e}")))
                },
            )
            .await
    }
}

#[async_trait]
impl Plugin for WhoisPlugin {
    fn machine_name(&self) -> &'static str {
        "whois"
    }

    /// A failed lookup reports its message in place of the record.
    async fn analyse(&self, ctx: &ClassificationContext) -> InspectorResult<Value> {
        match self.record(ctx.registrable_domain()).await {
            Ok(record) => to_json(&record),
            Err(e) => {
                warn!("[Plugin] WHOIS for {} failed: {e}", ctx.domain());
                Ok(Value::String(e.to_string()))
            }
        }
    }
}
