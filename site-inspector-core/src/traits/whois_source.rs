//! WHOIS source trait

use std::time::Duration;

use async_trait::async_trait;
use site_inspector_toolbox::{ToolboxService, WhoisResult};

use crate::error::InspectorResult;

/// Registration facts for a registrable domain.
#[async_trait]
pub trait WhoisSource: Send + Sync {
    async fn lookup(&self, domain: &str) -> InspectorResult<WhoisResult>;
}

/// Queries the registry's WHOIS server directly.
#[derive(Debug, Clone, Copy)]
pub struct ToolboxWhois {
    timeout: Duration,
}

impl ToolboxWhois {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl WhoisSource for ToolboxWhois {
    async fn lookup(&self, domain: &str) -> InspectorResult<WhoisResult> {
        Ok(ToolboxService::whois_lookup(domain, self.timeout).await?)
    }
}
