//! Certificate presented on port 443.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use serde_json::{Value, json};

use super::{Plugin, to_json};
use crate::context::ClassificationContext;
use crate::error::InspectorResult;
use crate::traits::CertificateSource;

pub struct SslPlugin {
    certificates: Arc<dyn CertificateSource>,
}

impl SslPlugin {
    pub fn new(certificates: Arc<dyn CertificateSource>) -> Self {
        Self { certificates }
    }
}

#[async_trait]
impl Plugin for SslPlugin {
    fn machine_name(&self) -> &'static str {
        "ssl"
    }

    /// A host without a readable certificate reports `{}`.
    async fn analyse(&self, ctx: &ClassificationContext) -> InspectorResult<Value> {
        match self.certificates.certificate(ctx.domain()).await {
            Ok(facts) => to_json(&facts),
            Err(e) => {
                debug!("[Plugin] No certificate for {}: {e}", ctx.domain());
                Ok(json!({}))
            }
        }
    }
}
