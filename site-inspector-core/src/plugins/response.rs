//! Small single-value checks of the homepage response.

use async_trait::async_trait;
use serde_json::Value;

use super::Plugin;
use crate::context::ClassificationContext;
use crate::error::InspectorResult;

/// Homepage answers `401 Unauthorized`.
pub struct HttpAuthPlugin;

#[async_trait]
impl Plugin for HttpAuthPlugin {
    fn machine_name(&self) -> &'static str {
        "hasHttpAuth"
    }

    async fn analyse(&self, ctx: &ClassificationContext) -> InspectorResult<Value> {
        Ok(Value::Bool(ctx.response().is_some_and(|r| r.status == 401)))
    }
}

/// A Drupal secure session cookie is set on the homepage.
pub struct PhpSessionPlugin;

fn is_drupal_session_cookie(cookie: &str) -> bool {
    cookie
        .strip_prefix("SSESS")
        .and_then(|rest| rest.strip_suffix("HttpOnly"))
        .is_some_and(|middle| !middle.is_empty())
}

#[async_trait]
impl Plugin for PhpSessionPlugin {
    fn machine_name(&self) -> &'static str {
        "phpsession"
    }

    async fn analyse(&self, ctx: &ClassificationContext) -> InspectorResult<Value> {
        let found = ctx.response().is_some_and(|r| {
            r.header_values("set-cookie")
                .iter()
                .any(|cookie| is_drupal_session_cookie(cookie))
        });
        Ok(Value::Bool(found))
    }
}

/// The `X-Powered-By` header, verbatim.
pub struct PoweredByPlugin;

#[async_trait]
impl Plugin for PoweredByPlugin {
    fn machine_name(&self) -> &'static str {
        "poweredBy"
    }

    async fn analyse(&self, ctx: &ClassificationContext) -> InspectorResult<Value> {
        Ok(Value::String(ctx.header_line("X-Powered-By")))
    }
}
