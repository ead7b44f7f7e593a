//! Scraped OpenShift project record for the domain.

use async_trait::async_trait;
use log::debug;
use serde_json::{Map, Value};

use super::Plugin;
use super::backend::{OpenshiftProjects, header_namespace};
use crate::context::ClassificationContext;
use crate::error::InspectorResult;

/// Looks the domain up in the OpenShift projects snapshot.
///
/// The namespace in `X-Lagoon` decides when the header is present; otherwise
/// the first project with a route for the domain is used. Without a snapshot
/// or a match the result is `{}`.
pub struct OpenshiftProjectPlugin {
    projects: Option<OpenshiftProjects>,
}

impl OpenshiftProjectPlugin {
    pub fn new(projects: Option<OpenshiftProjects>) -> Self {
        Self { projects }
    }

    pub fn lookup(&self, ctx: &ClassificationContext) -> Option<Value> {
        let projects = self.projects.as_ref()?;
        let record = match header_namespace(ctx) {
            Some(namespace) => projects.record(&namespace),
            None => projects.record_for_host(ctx.domain()),
        };
        if record.is_none() {
            debug!("[Plugin] No OpenShift project for {}", ctx.domain());
        }
        record.cloned()
    }
}

#[async_trait]
impl Plugin for OpenshiftProjectPlugin {
    fn machine_name(&self) -> &'static str {
        "openshiftProject"
    }

    async fn analyse(&self, ctx: &ClassificationContext) -> InspectorResult<Value> {
        Ok(self.lookup(ctx).unwrap_or_else(|| Value::Object(Map::new())))
    }
}
