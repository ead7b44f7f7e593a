//! TLS certificate source trait

use std::time::Duration;

use async_trait::async_trait;
use site_inspector_toolbox::{CertificateFacts, ToolboxService};

use crate::error::InspectorResult;

/// Facts about the leaf certificate a host serves on port 443.
#[async_trait]
pub trait CertificateSource: Send + Sync {
    async fn certificate(&self, host: &str) -> InspectorResult<CertificateFacts>;
}

/// Performs a TLS handshake through the toolbox.
#[derive(Debug, Clone, Copy)]
pub struct ToolboxCertificates {
    timeout: Duration,
}

impl ToolboxCertificates {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CertificateSource for ToolboxCertificates {
    async fn certificate(&self, host: &str) -> InspectorResult<CertificateFacts> {
        Ok(ToolboxService::certificate_facts(host, self.timeout).await?)
    }
}
